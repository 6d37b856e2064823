use std::fmt::Write;

use jiff::{Zoned, tz::TimeZone};
use log::Record;
use logforth::{
    append::Stdout,
    layout::{JsonLayout, Layout},
};

use crate::args::{Args, LogStyle};

#[derive(Debug, Clone)]
struct CustomTextLayout {
    no_color: bool,
}

impl CustomTextLayout {
    fn new() -> Self {
        Self { no_color: false }
    }

    fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }
}

impl Layout for CustomTextLayout {
    fn format(
        &self,
        record: &Record<'_>,
        _diagnostics: &[Box<dyn logforth::diagnostic::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let mut output = String::new();
        let now = Zoned::now().with_time_zone(TimeZone::UTC);

        write!(output, "{} ", now.strftime("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = record.level();

        if self.no_color {
            write!(output, "{level:>5}  ")?;
        } else {
            let color = match level {
                log::Level::Error => 31,
                log::Level::Warn => 33,
                log::Level::Info => 32,
                log::Level::Debug => 34,
                log::Level::Trace => 35,
            };

            write!(output, "\x1b[{color}m{level:>5}\x1b[0m  ")?;
        }

        write!(output, "{}", record.args())?;

        Ok(output.into_bytes())
    }
}

pub(super) fn init(args: &Args) -> anyhow::Result<()> {
    let filter = args.log_level.env_filter()?;

    logforth::builder()
        .dispatch(|d| {
            let d = d.filter(filter);

            match args.log_style {
                LogStyle::Color => d.append(Stdout::default().with_layout(CustomTextLayout::new())),
                LogStyle::Text => d.append(Stdout::default().with_layout(CustomTextLayout::new().no_color())),
                LogStyle::Json => d.append(Stdout::default().with_layout(JsonLayout::default())),
            }
        })
        .apply();

    Ok(())
}
