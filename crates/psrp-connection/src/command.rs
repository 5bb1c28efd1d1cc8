use std::{borrow::Cow, sync::OnceLock};

use base64::{
    Engine,
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use regex::Regex;

use crate::error::ConnectionError;

/// A trailing `-EncodedCommand <base64>`, optionally followed by one newline.
const ENCODED_COMMAND_PATTERN: &str =
    r"-EncodedCommand ((?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?)\n?\z";

/// Standard alphabet, lenient about non-zero bits after the last symbol.
const ENCODED_COMMAND_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Characters that end the first line of piped input.
const LINE_BOUNDARIES: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Statement appended to raw commands so the native exit code reaches the host.
pub const EXIT_CODE_SUFFIX: &str = "\nexit $LASTEXITCODE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Command text as given, run with [`EXIT_CODE_SUFFIX`] appended.
    Raw(String),
    /// Script recovered from a trailing `-EncodedCommand <base64>`.
    Encoded(String),
}

/// A command line submitted for execution, optionally with data piped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    raw_text: String,
    script: Script,
    input: Option<Vec<u8>>,
}

impl CommandRequest {
    pub fn parse(raw_text: impl Into<String>) -> Result<Self, ConnectionError> {
        let raw_text = raw_text.into();
        let script = match extract_encoded_command(&raw_text) {
            Some(payload) => Script::Encoded(decode_encoded_command(payload)?),
            None => Script::Raw(raw_text.clone()),
        };

        Ok(Self {
            raw_text,
            script,
            input: None,
        })
    }

    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn is_encoded_script(&self) -> bool {
        matches!(self.script, Script::Encoded(_))
    }

    pub fn decoded_script(&self) -> Option<&str> {
        match &self.script {
            Script::Encoded(script) => Some(script),
            Script::Raw(_) => None,
        }
    }

    pub fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    /// Piped input as text, empty input counts as none.
    pub fn input_text(&self) -> Option<String> {
        self.input
            .as_deref()
            .filter(|input| !input.is_empty())
            .map(|input| String::from_utf8_lossy(input).into_owned())
    }

    /// The script body sent to the remote pipeline.
    pub fn script_body(&self) -> Cow<'_, str> {
        match &self.script {
            Script::Raw(command) => Cow::Owned(format!("{command}{EXIT_CODE_SUFFIX}")),
            Script::Encoded(script) => Cow::Borrowed(script),
        }
    }

    /// Interpreter named by a `#!` first line of the input of an encoded script.
    ///
    /// Such requests cannot be dispatched over PSRP and must be rejected.
    pub fn shebang_interpreter(&self) -> Option<String> {
        if !self.is_encoded_script() {
            return None;
        }

        let input = self.input.as_deref()?.strip_prefix(b"#!")?;
        let input = String::from_utf8_lossy(input);
        let first_line = input.split(LINE_BOUNDARIES).next().unwrap_or_default();

        Some(first_line.to_owned())
    }
}

fn encoded_command_regex() -> &'static Regex {
    static ENCODED_COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    ENCODED_COMMAND_RE
        .get_or_init(|| Regex::new(ENCODED_COMMAND_PATTERN).expect("valid regex"))
}

fn extract_encoded_command(command: &str) -> Option<&str> {
    encoded_command_regex()
        .captures(command)
        .and_then(|captures| captures.get(1))
        .map(|payload| payload.as_str())
}

fn decode_encoded_command(payload: &str) -> Result<String, ConnectionError> {
    let bytes = ENCODED_COMMAND_ENGINE
        .decode(payload)
        .map_err(|e| ConnectionError::Decode(format!("invalid base64: {e}").into()))?;

    if bytes.len() % 2 != 0 {
        return Err(ConnectionError::Decode(
            "UTF-16LE payload has an odd number of bytes".into(),
        ));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units)
        .map_err(|e| ConnectionError::Decode(format!("invalid UTF-16LE: {e}").into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(script: &str) -> String {
        let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_raw_command_gets_exit_code_suffix() {
        let request = CommandRequest::parse("Get-Date").unwrap();

        assert!(!request.is_encoded_script());
        assert_eq!(request.decoded_script(), None);
        assert_eq!(request.script_body(), "Get-Date\nexit $LASTEXITCODE");
    }

    #[test]
    fn test_encoded_command_is_decoded_verbatim() {
        let script = "Write-Output 'héllo'\n$x = 1";
        let command = format!(
            "powershell -NoProfile -NonInteractive -EncodedCommand {}",
            encode(script)
        );

        let request = CommandRequest::parse(command).unwrap();
        assert!(request.is_encoded_script());
        assert_eq!(request.decoded_script(), Some(script));
        assert_eq!(request.script_body(), script);
        assert!(!request.script_body().contains("LASTEXITCODE"));
    }

    #[test]
    fn test_encoded_command_paddings() {
        // 1, 2 and 3 UTF-16 code units give "=", "==" and no padding
        for script in ["a", "ab", "abc"] {
            let request =
                CommandRequest::parse(format!("-EncodedCommand {}", encode(script))).unwrap();
            assert_eq!(request.decoded_script(), Some(script));
        }
    }

    #[test]
    fn test_empty_encoded_payload() {
        let request = CommandRequest::parse("pwsh -EncodedCommand ").unwrap();
        assert_eq!(request.decoded_script(), Some(""));
    }

    #[test]
    fn test_malformed_padding_is_a_raw_command() {
        let request = CommandRequest::parse("pwsh -EncodedCommand abc==").unwrap();
        assert!(!request.is_encoded_script());

        let request = CommandRequest::parse("pwsh -EncodedCommand YQ=A").unwrap();
        assert!(!request.is_encoded_script());
    }

    #[test]
    fn test_encoded_command_must_be_trailing() {
        let command = format!("pwsh -EncodedCommand {} -NoExit", encode("1"));
        let request = CommandRequest::parse(command.clone()).unwrap();

        assert!(!request.is_encoded_script());
        assert_eq!(request.script_body(), format!("{command}\nexit $LASTEXITCODE"));
    }

    #[test]
    fn test_encoded_command_with_trailing_newline() {
        // "YQBiAA==" is "ab" in UTF-16LE
        let request = CommandRequest::parse("pwsh -EncodedCommand YQBiAA==\n").unwrap();
        assert!(request.is_encoded_script());
        assert_eq!(request.decoded_script(), Some("ab"));

        let request = CommandRequest::parse("pwsh -EncodedCommand YQBiAA==\n\n").unwrap();
        assert!(!request.is_encoded_script());
    }

    #[test]
    fn test_encoded_command_ignores_trailing_bits() {
        // Last symbol 'B' leaves non-zero bits past the final byte
        let request = CommandRequest::parse("pwsh -EncodedCommand YQBiAB==").unwrap();
        assert_eq!(request.decoded_script(), Some("ab"));
    }

    #[test]
    fn test_encoded_command_regex_is_shared() {
        assert!(std::ptr::eq(encoded_command_regex(), encoded_command_regex()));
        assert_eq!(
            extract_encoded_command("pwsh -EncodedCommand YQBiAA=="),
            Some("YQBiAA==")
        );
        assert_eq!(extract_encoded_command("Get-Date"), None);
    }

    #[test]
    fn test_odd_length_utf16_payload_is_rejected() {
        // "YQ==" decodes to the single byte 'a'
        let result = CommandRequest::parse("-EncodedCommand YQ==");
        assert!(matches!(result, Err(ConnectionError::Decode(_))));
    }

    #[test]
    fn test_shebang_interpreter() {
        let command = format!("-EncodedCommand {}", encode("$input | Out-Null"));
        let request = CommandRequest::parse(command)
            .unwrap()
            .with_input(b"#!/usr/bin/python3\r\nimport sys\n".to_vec());

        assert_eq!(
            request.shebang_interpreter().as_deref(),
            Some("/usr/bin/python3")
        );
    }

    #[test]
    fn test_shebang_interpreter_line_boundaries() {
        let command = format!("-EncodedCommand {}", encode("$input | Out-Null"));
        let inputs: [&[u8]; 4] = [
            b"#!/bin/sh\rx",
            b"#!/bin/sh\x0cx",
            "#!/bin/sh\u{2028}x".as_bytes(),
            b"#!/bin/sh",
        ];

        for input in inputs {
            let request = CommandRequest::parse(command.clone())
                .unwrap()
                .with_input(input.to_vec());
            assert_eq!(request.shebang_interpreter().as_deref(), Some("/bin/sh"));
        }
    }

    #[test]
    fn test_shebang_only_matters_for_encoded_scripts() {
        let request = CommandRequest::parse("Get-Content")
            .unwrap()
            .with_input(b"#!/bin/sh\n".to_vec());
        assert_eq!(request.shebang_interpreter(), None);

        let command = format!("-EncodedCommand {}", encode("1"));
        let request = CommandRequest::parse(command)
            .unwrap()
            .with_input(b"plain data".to_vec());
        assert_eq!(request.shebang_interpreter(), None);
    }

    #[test]
    fn test_input_text() {
        let request = CommandRequest::parse("cat").unwrap();
        assert_eq!(request.input_text(), None);

        let request = request.with_input(Vec::new());
        assert_eq!(request.input_text(), None);

        let request = request.with_input(b"data".to_vec());
        assert_eq!(request.input_text().as_deref(), Some("data"));
        assert_eq!(request.input(), Some(b"data".as_slice()));
    }
}
