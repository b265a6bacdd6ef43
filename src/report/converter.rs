use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::process::Command;

use crate::error::{LcaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Docx,
    Html,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" | "word" => Ok(OutputFormat::Docx),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Turns a saved markdown report into a presentation format
#[async_trait::async_trait]
pub trait Converter: Send + Sync {
    fn name(&self) -> &str;
    async fn is_available(&self) -> bool;
    /// Convert `report` next to itself; returns the written file. The
    /// markdown file is never modified.
    async fn convert(&self, report: &Path, format: OutputFormat) -> Result<PathBuf>;
}

/// Converter backed by the pandoc executable
pub struct PandocConverter {
    program: String,
    template_dir: PathBuf,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            template_dir: template_dir.into(),
        }
    }

    fn template(&self, file: &str) -> Option<PathBuf> {
        let path = self.template_dir.join(file);
        path.is_file().then_some(path)
    }

    /// Command-line arguments after the program name
    pub fn arguments(&self, report: &Path, output: &Path, format: OutputFormat) -> Vec<String> {
        let mut args = vec![
            report.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        match format {
            OutputFormat::Html => {
                args.extend(
                    ["--standalone", "--embed-resources", "--section-divs", "--mathjax"]
                        .map(String::from),
                );
                if let Some(before) = self.template("before_body.html") {
                    args.push("--include-before-body".to_string());
                    args.push(before.display().to_string());
                }
                if let Some(after) = self.template("after_body.html") {
                    args.push("--include-after-body".to_string());
                    args.push(after.display().to_string());
                }
            }
            OutputFormat::Docx => {
                if let Some(reference) = self.template("template.docx") {
                    args.push("--reference-doc".to_string());
                    args.push(reference.display().to_string());
                }
            }
            OutputFormat::Pdf => {}
        }
        args
    }
}

#[async_trait::async_trait]
impl Converter for PandocConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn is_available(&self) -> bool {
        match Command::new(&self.program).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                log::debug!("{} not available: {}", self.program, e);
                false
            }
        }
    }

    async fn convert(&self, report: &Path, format: OutputFormat) -> Result<PathBuf> {
        if !report.is_file() {
            return Err(LcaError::MissingReport(report.to_path_buf()));
        }
        let output = report.with_extension(format.extension());
        let args = self.arguments(report, &output, format);
        log::debug!("running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| LcaError::Conversion {
                report: report.to_path_buf(),
                reason: format!("could not run {}: {}", self.program, e),
            })?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(LcaError::Conversion {
                report: report.to_path_buf(),
                reason: format!("{} exited with {}: {}", self.program, result.status, stderr.trim()),
            });
        }
        log::info!("report converted to {}", output.display());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("word".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert!("odt".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_html_arguments_include_fragments_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("before_body.html"), "<header/>").unwrap();
        let pandoc = PandocConverter::new("pandoc", dir.path());
        let args = pandoc.arguments(Path::new("r.md"), Path::new("r.html"), OutputFormat::Html);
        assert_eq!(&args[..3], &["r.md", "--output", "r.html"]);
        assert!(args.contains(&"--embed-resources".to_string()));
        assert!(args.contains(&"--include-before-body".to_string()));
        assert!(!args.contains(&"--include-after-body".to_string()));
    }

    #[test]
    fn test_docx_without_reference_doc() {
        let dir = tempfile::tempdir().unwrap();
        let pandoc = PandocConverter::new("pandoc", dir.path());
        let args = pandoc.arguments(Path::new("r.md"), Path::new("r.docx"), OutputFormat::Docx);
        assert_eq!(args.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_program_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("r.md");
        std::fs::write(&report, "# Overview\n").unwrap();
        let converter = PandocConverter::new("definitely-not-a-converter-binary", dir.path());

        assert!(!converter.is_available().await);
        match converter.convert(&report, OutputFormat::Pdf).await {
            Err(LcaError::Conversion { report: path, .. }) => assert_eq!(path, report),
            other => panic!("expected conversion error, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&report).unwrap(), "# Overview\n");
    }
}
