//! scriptable output for ctlcond
//!
//! JSON mode wraps every payload in a JSON-RPC 2.0 envelope with a null id:
//! `{"jsonrpc":"2.0","result":{..},"id":null}` on success and
//! `{"jsonrpc":"2.0","error":{"code":N,"message":"..","data":{..}},"id":null}`
//! on failure. error codes are the exit code offset into the -32000 range.

use serde::Serialize;
use std::io::IsTerminal;

use crate::conditions::Value;
use crate::registry::RegistryStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    /// JSON-RPC envelopes on stdout
    Json,
    /// nothing on success, errors still reach stderr
    Quiet,
}

impl OutputMode {
    /// --quiet beats --json beats --no-json; with none of them, JSON is used
    /// whenever stdout is not a terminal
    pub fn from_flags(json: bool, no_json: bool, quiet: bool) -> Self {
        match (quiet, json, no_json) {
            (true, _, _) => Self::Quiet,
            (_, true, _) => Self::Json,
            (_, _, true) => Self::Text,
            _ if std::io::stdout().is_terminal() => Self::Text,
            _ => Self::Json,
        }
    }

    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }

    pub fn is_quiet(&self) -> bool {
        *self == Self::Quiet
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    jsonrpc: &'static str,
    #[serde(flatten)]
    body: Body<'a, T>,
    id: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Body<'a, T: Serialize> {
    Result(&'a T),
    Error(RpcError),
}

impl<'a, T: Serialize> Envelope<'a, T> {
    fn new(body: Body<'a, T>) -> Self {
        Self {
            jsonrpc: "2.0",
            body,
            id: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub suggestions: Vec<String>,
}

impl RpcError {
    /// build an application error from a process exit code
    pub fn from_exit_code(exit_code: i32, message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            code: -32000 - exit_code,
            message: message.into(),
            data: (!suggestions.is_empty()).then_some(ErrorData { suggestions }),
        }
    }
}

/// visibility of one control
#[derive(Serialize)]
pub struct ControlData {
    pub control: String,
    pub visible: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<usize>,
}

#[derive(Serialize)]
pub struct CheckData {
    pub controls: Vec<ControlData>,
}

/// one evaluated leaf term
#[derive(Serialize)]
pub struct TermData {
    pub term: String,
    /// resolved setting value, absent when the setting is undefined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,
    pub result: bool,
}

/// one registered condition as seen by `explain`
#[derive(Serialize)]
pub struct ConditionTrace {
    pub index: usize,
    pub action: &'static str,
    pub conditions: String,
    pub matched: bool,
    pub terms: Vec<TermData>,
}

#[derive(Serialize)]
pub struct ExplainData {
    pub control: String,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub conditions: Vec<ConditionTrace>,
}

/// controls depending on a single setting
#[derive(Serialize)]
pub struct DependentsData {
    pub setting: String,
    pub controls: Vec<String>,
}

#[derive(Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub stats: RegistryStats,
}

fn render<T: Serialize>(body: Body<'_, T>) -> Option<String> {
    serde_json::to_string(&Envelope::new(body)).ok()
}

/// print a success envelope to stdout
pub fn print_json<T: Serialize>(data: &T) {
    if let Some(json) = render(Body::Result(data)) {
        println!("{}", json);
    }
}

/// print an error envelope to stdout
pub fn print_json_error(exit_code: i32, message: &str, suggestions: Vec<String>) {
    let body: Body<'_, ()> = Body::Error(RpcError::from_exit_code(exit_code, message, suggestions));
    if let Some(json) = render(body) {
        println!("{}", json);
    }
}
