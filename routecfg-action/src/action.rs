//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use routecfg_value::ValueKind;

use crate::error::Error;
use crate::token::extract_var_refs;

// One argument of a remote call's query string: `name:type=value`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallArg {
    pub name: String,
    pub kind: ValueKind,
    // Raw text, not yet expanded against a node's bindings.
    pub value: String,
}

// One entry of a remote call's return spec: `name:type=var`, read as
// "the returned atom `name` of type `type` is stored under `var`".
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSpec {
    pub name: String,
    pub kind: ValueKind,
    pub var: String,
}

// A parsed `xrl` action: `target/method?args…->rets…`.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteCall {
    // Raw target text; may begin with `$` to mean "the declaring
    // module's default target", resolved at validation time.
    pub target: String,
    pub method: String,
    pub args: Vec<CallArg>,
    pub returns: Vec<ReturnSpec>,
}

// A parsed `program` action: `program "path args…" [-> stdout=a & stderr=b]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SubprocessCall {
    // Raw, unexpanded command line (may itself contain `$(...)`).
    pub command_line: String,
    pub stdout_var: Option<String>,
    pub stderr_var: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Remote(RemoteCall),
    Subprocess(SubprocessCall),
}

// ===== impl Action =====

impl Action {
    // Parses one `%command: action-body;` body (the body only, without
    // the command name or terminating semicolon).
    pub fn parse(body: &str) -> Result<Self, Error> {
        let body = body.trim();
        if let Some(rest) = body.strip_prefix("xrl ") {
            Self::parse_remote(rest.trim())
        } else if let Some(rest) = body.strip_prefix("program ") {
            Self::parse_subprocess(rest.trim())
        } else {
            Err(Error::Parse(body.to_string()))
        }
    }

    fn parse_remote(rest: &str) -> Result<Self, Error> {
        let rest = unquote(rest);
        let (call, returns) = match rest.split_once("->") {
            Some((call, returns)) => (call, Some(returns)),
            None => (rest.as_str(), None),
        };

        let (target_method, args) = match call.split_once('?') {
            Some((tm, args)) => (tm, Some(args)),
            None => (call, None),
        };

        let (target, method) = target_method.rsplit_once('/').ok_or_else(|| {
            Error::MalformedRemoteCall(format!("missing '/' in target/method: {call}"))
        })?;

        let mut parsed_args = Vec::new();
        if let Some(args) = args {
            for entry in args.split('&').filter(|s| !s.is_empty()) {
                parsed_args.push(parse_call_arg(entry)?);
            }
        }

        let mut parsed_returns = Vec::new();
        if let Some(returns) = returns {
            for entry in returns.split('&').filter(|s| !s.is_empty()) {
                parsed_returns.push(parse_return_spec(entry)?);
            }
        }

        Ok(Action::Remote(RemoteCall {
            target: target.to_string(),
            method: method.to_string(),
            args: parsed_args,
            returns: parsed_returns,
        }))
    }

    fn parse_subprocess(rest: &str) -> Result<Self, Error> {
        let (command_part, capture_part) = match rest.split_once("->") {
            Some((c, k)) => (c.trim(), Some(k.trim())),
            None => (rest, None),
        };
        let command_line = unquote(command_part);

        let mut stdout_var = None;
        let mut stderr_var = None;
        if let Some(capture_part) = capture_part {
            for entry in capture_part.split('&').map(str::trim).filter(|s| !s.is_empty()) {
                if let Some(var) = entry.strip_prefix("stdout=") {
                    if stdout_var.is_some() {
                        return Err(Error::DuplicateCapture("stdout"));
                    }
                    stdout_var = Some(var.to_string());
                } else if let Some(var) = entry.strip_prefix("stderr=") {
                    if stderr_var.is_some() {
                        return Err(Error::DuplicateCapture("stderr"));
                    }
                    stderr_var = Some(var.to_string());
                } else {
                    return Err(Error::Parse(format!("unrecognized capture clause: {entry}")));
                }
            }
        }

        Ok(Action::Subprocess(SubprocessCall {
            command_line,
            stdout_var,
            stderr_var,
        }))
    }

    // Every `$(...)` reference this action's body contains, in the order
    // they occur, across the target, args, and (for subprocesses) the
    // command line. Used by `check_referred_variables` and, later, by
    // expansion.
    pub fn referenced_variables(&self) -> Vec<String> {
        match self {
            Action::Remote(call) => {
                let mut refs = extract_var_refs(&call.target);
                for arg in &call.args {
                    refs.extend(extract_var_refs(&arg.value));
                }
                refs
            }
            Action::Subprocess(call) => extract_var_refs(&call.command_line),
        }
    }
}

fn parse_call_arg(entry: &str) -> Result<CallArg, Error> {
    let (name, rest) = entry.split_once(':').ok_or_else(|| {
        Error::MalformedRemoteCall(format!("argument missing type: {entry}"))
    })?;
    let (kind, value) = rest.split_once('=').ok_or_else(|| {
        Error::MalformedRemoteCall(format!("argument missing value: {entry}"))
    })?;
    let kind: ValueKind = kind
        .parse()
        .map_err(|_| Error::MalformedRemoteCall(format!("unknown argument type: {kind}")))?;
    Ok(CallArg {
        name: name.to_string(),
        kind,
        value: value.to_string(),
    })
}

fn parse_return_spec(entry: &str) -> Result<ReturnSpec, Error> {
    let (name, rest) = entry.split_once(':').ok_or_else(|| {
        Error::MalformedRemoteCall(format!("return spec missing type: {entry}"))
    })?;
    let (kind, var) = rest.split_once('=').ok_or_else(|| {
        Error::MalformedRemoteCall(format!("return spec missing variable: {entry}"))
    })?;
    let kind: ValueKind = kind
        .parse()
        .map_err(|_| Error::MalformedRemoteCall(format!("unknown return type: {kind}")))?;
    Ok(ReturnSpec {
        name: name.to_string(),
        kind,
        var: var.to_string(),
    })
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_call_with_args_and_returns() {
        let action = Action::parse(
            r#"xrl "$(@.module)/1.0/set_mtu?ifname:txt=$(@)&mtu:u32=$(@.mtu)->status:u32=rc""#,
        )
        .unwrap();
        let Action::Remote(call) = action else {
            panic!("expected remote call");
        };
        assert_eq!(call.target, "$(@.module)/1.0");
        assert_eq!(call.method, "set_mtu");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[0].name, "ifname");
        assert_eq!(call.args[0].kind, ValueKind::Text);
        assert_eq!(call.returns.len(), 1);
        assert_eq!(call.returns[0].var, "rc");
    }

    #[test]
    fn parses_subprocess_with_both_captures() {
        let action =
            Action::parse(r#"program "/usr/bin/genkey" -> stdout=key & stderr=err"#).unwrap();
        let Action::Subprocess(call) = action else {
            panic!("expected subprocess call");
        };
        assert_eq!(call.command_line, "/usr/bin/genkey");
        assert_eq!(call.stdout_var.as_deref(), Some("key"));
        assert_eq!(call.stderr_var.as_deref(), Some("err"));
    }

    #[test]
    fn rejects_duplicate_capture() {
        let err =
            Action::parse(r#"program "/bin/true" -> stdout=a & stdout=b"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateCapture("stdout")));
    }

    #[test]
    fn collects_referenced_variables() {
        let action = Action::parse(
            r#"xrl "target/method?mtu:u32=$(@.mtu)->rc:u32=out""#,
        )
        .unwrap();
        assert_eq!(action.referenced_variables(), vec!["@.mtu".to_string()]);
    }
}
