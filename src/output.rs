use crate::prelude::*;
use std::fmt::Debug;

use console::{Emoji, Style, StyledObject};
use tracing::{
    field::{Field, Visit},
    metadata::LevelFilter,
    span::Attributes,
    Event, Id, Level, Subscriber,
};
use tracing_subscriber::{
    filter::{EnvFilter, Targets},
    layer::{Context, Layer},
    prelude::*,
    registry::{LookupSpan, SpanRef},
};

use clap::{Args, ValueEnum};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Increase verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Reduce verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,
    #[arg(long, default_value_t = ColorChoice::Auto, value_enum, value_name = "WHEN", global = true)]
    color: ColorChoice,
}

impl OutputArgs {
    fn level(&self) -> Level {
        let verbosity = i8::try_from(self.verbose)
            .unwrap_or(i8::MAX)
            .saturating_sub(i8::try_from(self.quiet).unwrap_or(i8::MAX));
        match verbosity {
            2.. => Level::TRACE,
            1 => Level::DEBUG,
            0 => Level::INFO,
            -1 => Level::WARN,
            i8::MIN..=-2 => Level::ERROR,
        }
    }
}

/// Prints our own events to stderr, styled by level. Warnings say which
/// dependency they were about.
struct DepspecUILayer;

struct WithMessage<'a, F>(&'a F)
where
    F: Fn(&dyn Debug);

impl<'a, F> Visit for WithMessage<'a, F>
where
    F: Fn(&dyn Debug),
{
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            (self.0)(value);
        }
    }
}

struct MessageAsString(String);

static WARNING: Lazy<StyledObject<Emoji<'static, 'static>>> = Lazy::new(|| {
    Style::new()
        .yellow()
        .bold()
        .for_stderr()
        .apply_to(Emoji("⚠️  Warning:", "Warning:"))
});

static ERROR: Lazy<StyledObject<Emoji<'static, 'static>>> = Lazy::new(|| {
    Style::new()
        .red()
        .bold()
        .for_stderr()
        .apply_to(Emoji("🛑  Error:", "Error:"))
});

static DIM: Lazy<Style> = Lazy::new(|| Style::new().dim().for_stderr());

fn collect_context<S>(leaf: Option<SpanRef<S>>) -> Vec<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match leaf {
        Some(leaf) => leaf
            .scope()
            .from_root()
            .filter_map(|span| {
                span.extensions()
                    .get::<MessageAsString>()
                    .map(|m| m.0.clone())
            })
            .collect(),
        None => Vec::new(),
    }
}

/// The messages of all open `context!` spans, outermost first.
pub fn current_context() -> Vec<String> {
    tracing::dispatcher::get_default(|dispatch| {
        if let Some(registry) = dispatch.downcast_ref::<tracing_subscriber::Registry>() {
            // Span::current() would look up the dispatcher again, and inside
            // get_default it's temporarily unset.
            if let Some(leaf_id) = registry.current_span().id() {
                return collect_context(registry.span(leaf_id));
            }
        }
        Vec::new()
    })
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for DepspecUILayer {
    /// Render the message of each context!(...) span once, and keep it in the
    /// span's registry entry.
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if span.metadata().target() == CONTEXT_TARGET {
            attrs.record(&mut WithMessage(&|msg| {
                let as_string = MessageAsString(format!("{:?}", msg));
                span.extensions_mut().insert(as_string);
            }));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level <= Level::WARN {
            for context in collect_context(ctx.event_span(event)) {
                eprintln!("{}", DIM.apply_to(format!("while {}:", context)));
            }
        }
        event.record(&mut WithMessage(&|msg| match level {
            Level::ERROR => eprintln!("{} {:?}", &*ERROR, msg),
            Level::WARN => eprintln!("{} {:?}", &*WARNING, msg),
            _ => eprintln!("{:?}", msg),
        }));
    }
}

pub const CONTEXT_TARGET: &str = "depspec::context";

/// Open a span describing what we're doing, until the end of the enclosing
/// block. Shows up in warnings and error reports.
#[macro_export]
macro_rules! context {
    ($($arg:tt)*) => {
        let _guard = tracing::span!(target: "depspec::context", tracing::Level::ERROR, "context", $($arg)*).entered();
    }
}

struct ReportHandler {
    context: Vec<String>,
    backtrace: Option<backtrace::Backtrace>,
}

impl ReportHandler {
    fn new() -> ReportHandler {
        let want_backtrace = std::env::var_os("DEPSPEC_BACKTRACE").is_some();
        ReportHandler {
            context: current_context(),
            backtrace: want_backtrace.then(backtrace::Backtrace::new_unresolved),
        }
    }
}

impl eyre::EyreHandler for ReportHandler {
    fn debug(
        &self,
        error: &(dyn std::error::Error + 'static),
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "{}", error)?;
        let mut source = error.source();
        while let Some(cause) = source {
            write!(f, "\n  caused by: {}", cause)?;
            source = cause.source();
        }
        for context in self.context.iter().rev() {
            write!(f, "\n  while {}", context)?;
        }
        if let Some(backtrace) = &self.backtrace {
            // resolving needs &mut
            let mut backtrace = backtrace.clone();
            backtrace.resolve();
            write!(f, "\n\nBacktrace:\n{backtrace:?}")?;
        }
        Ok(())
    }
}

pub fn init(args: &OutputArgs) -> Result<()> {
    eyre::set_hook(Box::new(|_| Box::new(ReportHandler::new())))
        .wrap_err("error report handler was already installed")?;

    match args.color {
        ColorChoice::Auto => (),
        ColorChoice::Always => console::set_colors_enabled_stderr(true),
        ColorChoice::Never => console::set_colors_enabled_stderr(false),
    }

    tracing_subscriber::registry()
        .with(DepspecUILayer.with_filter(Targets::new().with_target("depspec", args.level())))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(LevelFilter::OFF.into())
                        .with_env_var("DEPSPEC_DEBUG")
                        .from_env_lossy(),
                ),
        )
        .try_init()
        .wrap_err("failed to install the log subscriber")?;
    Ok(())
}
