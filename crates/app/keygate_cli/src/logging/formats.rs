use flexi_logger::DeferredNow;
use log::Record;

/// `LEVEL message`, with the target appended at debug and below.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    if level <= log::Level::Info {
        write!(w, "{:<5} {}", level, record.args())
    } else {
        write!(w, "{:<5} [{}] {}", level, record.target(), record.args())
    }
}
