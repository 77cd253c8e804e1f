//! Hardware and presentation hooks supplied by the host application.

use crate::mail::MailMessage;
use crate::session::DataRecord;

/// The chamber's temperature probe.
pub trait TemperatureSensor: Send {
    /// Read the current chamber temperature in degrees Celsius.
    fn read_temperature(&mut self) -> anyhow::Result<f64>;
}

/// Draws the chart stored for a period.
pub trait ChartRenderer: Send {
    /// PNG bytes of the real and target temperatures of `records`.
    /// An empty result means no chart is stored for this save.
    fn render_chart(&self, records: &[DataRecord], period_index: u32) -> Vec<u8>;
}

/// Delivers a composed message, e.g. over SMTP.
pub trait MailSender {
    fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Renders nothing. Saves then keep whatever figures the archive already has.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChart;

impl ChartRenderer for NoChart {
    fn render_chart(&self, _records: &[DataRecord], _period_index: u32) -> Vec<u8> {
        Vec::new()
    }
}
