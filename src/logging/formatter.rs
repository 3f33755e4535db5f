use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event format wrapping each field in brackets.
///
/// Format: `[TIMESTAMP]  [LEVEL] [SPANS] [TARGET: FILE:LINE]: MESSAGE`
///
/// `SPANS` is the chain of active spans from the root, joined with `:`
/// (e.g. `split:class`), or the last path segment of the target when the
/// event fires outside any span.
pub struct BracketedFormatter;

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let now = chrono::Local::now();
        write!(writer, "[{}]  ", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))?;
        write!(writer, "[{:5}] ", metadata.level())?;

        let spans = ctx
            .event_scope()
            .map(|scope| {
                scope
                    .from_root()
                    .map(|span| span.name())
                    .collect::<Vec<_>>()
                    .join(":")
            })
            .filter(|chain| !chain.is_empty())
            .unwrap_or_else(|| {
                metadata
                    .target()
                    .rsplit("::")
                    .next()
                    .unwrap_or("unknown")
                    .to_string()
            });
        write!(writer, "[{}] ", spans)?;

        match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => {
                write!(writer, "[{}: {}:{}]: ", metadata.target(), file, line)?
            }
            _ => write!(writer, "[{}]: ", metadata.target())?,
        }

        // Span fields (e.g. class name) follow the message
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(fields) =
                    extensions.get::<tracing_subscriber::fmt::FormattedFields<N>>()
                {
                    if !fields.is_empty() {
                        write!(writer, " {{{}}}", fields)?;
                    }
                }
            }
        }

        writeln!(writer)
    }
}
