use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, trace};

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Converts one raster image into another format.
///
/// Implementations must either produce `output` or return an error.
pub trait ImageConverter: Send + Sync {
    /// Reads `input` and writes the converted image to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the output could not be produced.
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Runs an external program such as ImageMagick's `convert`.
///
/// Each argument may contain `{input}` and `{output}`, which are replaced by
/// the respective paths. The program is spawned directly, not through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    /// Creates a converter for the given program and argument template.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates the converter described by the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.converter_program.clone(), config.converter_args.clone())
    }

    fn render_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

impl ImageConverter for CommandConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let args = self.render_args(input, output);
        trace!("Running {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                Error::conversion(input, output, format!("failed to run '{}': {e}", self.program))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("'{}' exited with {}", self.program, result.status)
            } else {
                format!("'{}' exited with {}: {stderr}", self.program, result.status)
            };
            return Err(Error::conversion(input, output, message));
        }

        if !output.exists() {
            return Err(Error::conversion(
                input,
                output,
                format!("'{}' succeeded but wrote no output", self.program),
            ));
        }

        debug!("Converted {} -> {}", input.display(), output.display());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
