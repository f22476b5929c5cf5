//! Script runner
//!
//! Executes a script inside a fresh engine [`Context`]. Besides the standard
//! ECMAScript built-ins the scope holds exactly:
//!
//! - `console.log`, which joins its arguments with a single space and appends
//!   the line to the captured output instead of writing anywhere;
//! - the input string, bound under [`RunnerOptions::input_binding`] when
//!   [`Bindings::input`] is set;
//! - every entry of [`Bindings::globals`].
//!
//! Bindings are installed in that order, so a global named `console` replaces
//! the capturing console. Promise jobs queued by the script are not run.
//!
//! ```text
//! let outcome = Runner::default().run_source("console.log('a', 1)", &Bindings::new())?;
//! assert_eq!(outcome.stdout, vec!["a 1"]);
//! ```

use crate::loader::{LoaderError, SourceLoader};
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsError, JsResult, JsString, JsValue, NativeFunction, Source};
use boa_gc::{Gc, GcRefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Global name that receives [`Bindings::input`] unless configured otherwise.
pub const DEFAULT_INPUT_BINDING: &str = "s";

/// Lines recorded by `console.log`, shared between the host and the engine.
type Captured = Gc<GcRefCell<Vec<String>>>;

/// Engine-level settings for a [`Runner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Global name for [`Bindings::input`]
    pub input_binding: String,
    /// Abort loops after this many iterations (engine default when `None`)
    pub loop_iteration_limit: Option<u64>,
    /// Abort after this call depth (engine default when `None`)
    pub recursion_limit: Option<usize>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            input_binding: DEFAULT_INPUT_BINDING.to_string(),
            loop_iteration_limit: None,
            recursion_limit: None,
        }
    }
}

/// Caller-supplied names merged into the script scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Challenge input, exposed as a string global
    pub input: Option<String>,
    /// Extra globals, converted from JSON values
    pub globals: BTreeMap<String, serde_json::Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.globals.insert(name.into(), value);
        self
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Completion value of the script: raw text for strings, the engine's
    /// display form for everything else
    pub value: String,
    /// Captured `console.log` lines in call order
    pub stdout: Vec<String>,
}

/// Errors that abort a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The script file could not be read
    Load(LoaderError),
    /// A binding could not be installed into the scope
    Binding { name: String, message: String },
    /// The script failed to parse, threw, or hit a runtime limit
    Execution(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Load(err) => write!(f, "{}", err),
            RunError::Binding { name, message } => {
                write!(f, "cannot bind global `{}`: {}", name, message)
            }
            RunError::Execution(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RunError {}

impl From<LoaderError> for RunError {
    fn from(err: LoaderError) -> Self {
        RunError::Load(err)
    }
}

/// Runs scripts, one fresh context per call
#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: RunnerOptions,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Read `path` and run it
    pub fn run_file<P: AsRef<Path>>(
        &self,
        path: P,
        bindings: &Bindings,
    ) -> Result<RunOutcome, RunError> {
        let loader = SourceLoader::from_path(path)?;
        self.run_source(loader.source_ref(), bindings)
    }

    /// Run `code` as a classic script
    pub fn run_source(&self, code: &str, bindings: &Bindings) -> Result<RunOutcome, RunError> {
        let mut context = Context::default();
        self.apply_limits(&mut context);

        let captured: Captured = Gc::new(GcRefCell::new(Vec::new()));
        install_console(&mut context, &captured).map_err(|err| RunError::Binding {
            name: "console".to_string(),
            message: err.to_string(),
        })?;
        self.install_bindings(&mut context, bindings)?;

        let value = context
            .eval(Source::from_bytes(code))
            .map_err(|err| RunError::Execution(describe_error(&err, &mut context)))?;

        let stdout = captured.borrow().clone();
        log::debug!("script finished, {} captured line(s)", stdout.len());
        Ok(RunOutcome {
            value: describe_value(&value),
            stdout,
        })
    }

    fn apply_limits(&self, context: &mut Context) {
        let limits = context.runtime_limits_mut();
        if let Some(limit) = self.options.loop_iteration_limit {
            limits.set_loop_iteration_limit(limit);
        }
        if let Some(limit) = self.options.recursion_limit {
            limits.set_recursion_limit(limit);
        }
    }

    fn install_bindings(&self, context: &mut Context, bindings: &Bindings) -> Result<(), RunError> {
        if let Some(input) = &bindings.input {
            let name = &self.options.input_binding;
            context
                .register_global_property(
                    JsString::from(name.as_str()),
                    JsString::from(input.as_str()),
                    Attribute::all(),
                )
                .map_err(|err| RunError::Binding {
                    name: name.clone(),
                    message: err.to_string(),
                })?;
        }

        for (name, value) in &bindings.globals {
            let binding_error = |err: JsError| RunError::Binding {
                name: name.clone(),
                message: err.to_string(),
            };
            let value = JsValue::from_json(value, context).map_err(binding_error)?;
            context
                .register_global_property(JsString::from(name.as_str()), value, Attribute::all())
                .map_err(binding_error)?;
        }

        log::debug!(
            "installed {} extra global(s), input {}",
            bindings.globals.len(),
            if bindings.input.is_some() { "bound" } else { "unbound" }
        );
        Ok(())
    }
}

fn install_console(context: &mut Context, captured: &Captured) -> JsResult<()> {
    let log = NativeFunction::from_copy_closure_with_captures(console_log, captured.clone());
    let console = ObjectInitializer::new(context)
        .function(log, js_string!("log"), 0)
        .build();
    context.register_global_property(js_string!("console"), console, Attribute::all())
}

/// `console.log`: array-join semantics, so `null` and `undefined` print empty.
fn console_log(
    _this: &JsValue,
    args: &[JsValue],
    captured: &Captured,
    context: &mut Context,
) -> JsResult<JsValue> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_null_or_undefined() {
            parts.push(String::new());
        } else {
            parts.push(arg.to_string(context)?.to_std_string_escaped());
        }
    }
    captured.borrow_mut().push(parts.join(" "));
    Ok(JsValue::undefined())
}

fn describe_error(error: &JsError, context: &mut Context) -> String {
    if let Ok(native) = error.try_native(context) {
        return native.to_string();
    }
    match error.as_opaque().and_then(JsValue::as_string) {
        Some(text) => text.to_std_string_escaped(),
        None => error.to_string(),
    }
}

fn describe_value(value: &JsValue) -> String {
    match value.as_string() {
        Some(text) => text.to_std_string_escaped(),
        None => value.display().to_string(),
    }
}
