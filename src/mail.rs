//! Composing the message that carries an archive to the lab's inbox.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{ChamberError, Result};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M";

/// Attachment name used while the archive has no user-chosen name.
pub const TEMPORARY_ATTACHMENT_NAME: &str = "attachment.zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

/// Build a message with the archive at `archive_path` attached.
pub fn compose(archive_path: &Path, temporary: bool, now: NaiveDateTime, to: &str) -> Result<MailMessage> {
    let attachment =
        std::fs::read(archive_path).map_err(|e| ChamberError::archive_io(archive_path, e))?;

    let attachment_name = if temporary {
        TEMPORARY_ATTACHMENT_NAME.to_string()
    } else {
        archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| TEMPORARY_ATTACHMENT_NAME.to_string())
    };

    let stamp = now.format(TIMESTAMP_FORMAT);
    Ok(MailMessage {
        to: to.to_string(),
        subject: format!("ENV chamber {}", stamp),
        body: format!("Environmental chamber measurement from {}", stamp),
        attachment_name,
        attachment,
    })
}
