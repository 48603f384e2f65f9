//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Recursive-descent parser for the schema text format (§6): nested
//! segment declarations terminated by `;` or a `{ ... }` block, and the
//! `%command` lines that attach actions, flags, and constraints.

use routecfg_action::Action;
use routecfg_value::{TypedValue, ValueKind, ValueRange};

use crate::error::Error;
use crate::node::{CommandSet, OrderPolicy, TemplateNode};

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    file: &'a str,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a> Cursor<'a> {
    fn new(text: &str, file: &'a str) -> Self {
        Cursor {
            chars: text.chars().collect(),
            pos: 0,
            file,
            _marker: std::marker::PhantomData,
        }
    }

    fn line(&self) -> u32 {
        1 + self.chars[..self.pos].iter().filter(|&&c| c == '\n').count() as u32
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(Some(self.file), Some(self.line()), message)
    }

    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.chars.len()
    }

    fn expect_char(&mut self, c: char) -> Result<(), Error> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // A bare word: letters, digits, and `-_./?&$():=<>@` combos stop at
    // whitespace or a structural delimiter.
    fn read_word(&mut self) -> Result<String, Error> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || "{};:=\"".contains(c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a word"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn read_number(&mut self) -> Result<i128, Error> {
        self.skip_ws();
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| self.err(format!("expected a number, found '{text}'")))
    }

    fn read_quoted(&mut self) -> Result<String, Error> {
        self.expect_char('"')?;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some('"') {
            return Err(self.err("unterminated string"));
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(s)
    }

    // Raw source text from the current position up to (excluding) the
    // next unquoted `;`, with surrounding whitespace trimmed.
    fn read_until_semicolon_raw(&mut self) -> Result<String, Error> {
        self.skip_ws();
        let start = self.pos;
        let mut in_quotes = false;
        while let Some(c) = self.peek() {
            match c {
                '"' => in_quotes = !in_quotes,
                ';' if !in_quotes => break,
                _ => {}
            }
            self.pos += 1;
        }
        if self.peek() != Some(';') {
            return Err(self.err("missing ';' terminator"));
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(s.trim().to_string())
    }
}

// Parses one `.tp`-style schema file's contents into `parent`'s
// children, inheriting `module_name` unless a `%module` command
// overrides it for a subtree.
pub fn parse_into(text: &str, file: &str, parent: &mut TemplateNode) -> Result<(), Error> {
    let mut cursor = Cursor::new(text, file);
    parse_block(&mut cursor, parent)
}

fn parse_block(cursor: &mut Cursor<'_>, parent: &mut TemplateNode) -> Result<(), Error> {
    loop {
        if cursor.eof() || cursor.peek() == Some('}') {
            return Ok(());
        }
        if cursor.peek() == Some('%') {
            parse_command(cursor, parent)?;
            continue;
        }
        let child = parse_segment(cursor, &parent.module_name, parent.children.len())?;
        parent.children.push(child);
    }
}

fn parse_segment(
    cursor: &mut Cursor<'_>,
    module_name: &str,
    child_number: usize,
) -> Result<TemplateNode, Error> {
    let segname = cursor.read_word()?;
    let mut node = TemplateNode::new_void(segname, module_name.to_string());
    node.child_number = child_number;

    if cursor.eat_char('@') {
        node.is_tag = true;
        cursor.expect_char(':')?;
        let kind_word = cursor.read_word()?;
        let kind: ValueKind = kind_word
            .parse()
            .map_err(|_| cursor.err(format!("unknown value kind: {kind_word}")))?;
        let mut key = TemplateNode::new_void("@", module_name.to_string());
        key.kind = Some(kind);
        node.children.push(key);
    } else if cursor.eat_char(':') {
        let kind_word = cursor.read_word()?;
        let kind: ValueKind = kind_word
            .parse()
            .map_err(|_| cursor.err(format!("unknown value kind: {kind_word}")))?;
        node.kind = Some(kind);
        if cursor.eat_char('=') {
            let default_text = if cursor.peek() == Some('"') {
                cursor.read_quoted()?
            } else {
                cursor.read_word()?
            };
            node.default = Some(
                TypedValue::parse(kind, &default_text)
                    .map_err(|e| cursor.err(e.to_string()))?,
            );
        }
    }

    if cursor.eat_char('{') {
        parse_block(cursor, &mut node)?;
        cursor.expect_char('}')?;
        cursor.expect_char(';')?;
    } else {
        cursor.expect_char(';')?;
    }

    Ok(node)
}

fn parse_command(cursor: &mut Cursor<'_>, node: &mut TemplateNode) -> Result<(), Error> {
    cursor.expect_char('%')?;
    let name = cursor.read_word()?;

    match name.as_str() {
        "read-only" => node.read_only = Some(cursor.read_quoted_terminated()?),
        "permanent" => node.permanent = Some(cursor.read_quoted_terminated()?),
        "deprecated" => node.deprecated = Some(cursor.read_quoted_terminated()?),
        "user-hidden" => node.user_hidden = Some(cursor.read_quoted_terminated()?),
        "module" => node.module_name = cursor.read_quoted_terminated()?,
        "default-target" => node.default_target_name = Some(cursor.read_quoted_terminated()?),
        "unique-in" => node.unique_in = Some(strip_var_ref(&cursor.read_quoted_terminated()?)),
        "mandatory" => {
            loop {
                cursor.skip_ws();
                if cursor.peek() != Some('"') {
                    break;
                }
                let reference = cursor.read_quoted()?;
                node.mandatory_config_nodes.push(strip_var_ref(&reference));
            }
            cursor.expect_char(';')?;
        }
        "order" => {
            let word = cursor.read_word()?;
            cursor.expect_char(';')?;
            node.order = match word.as_str() {
                "unsorted" => OrderPolicy::Unsorted,
                "sorted-numeric" => OrderPolicy::SortedNumeric,
                "sorted-alphabetic" => OrderPolicy::SortedAlphabetic,
                _ => return Err(cursor.err(format!("unknown order policy: {word}"))),
            };
        }
        "help" => {
            let which = cursor.read_word()?;
            let text = cursor.read_quoted()?;
            cursor.expect_char(';')?;
            match which.as_str() {
                "short" => node.help_short = Some(text),
                "long" => node.help_long = Some(text),
                _ => return Err(cursor.err(format!("unknown help variant: {which}"))),
            }
        }
        "allow" => {
            let value_text = cursor.read_quoted()?;
            let help = parse_optional_help(cursor)?;
            cursor.expect_char(';')?;
            let kind = node
                .kind
                .ok_or_else(|| cursor.err("%allow on a node with no value kind"))?;
            let value = TypedValue::parse(kind, &value_text).map_err(|e| cursor.err(e.to_string()))?;
            node.allowed_values.push((value, help));
        }
        "allow-range" => {
            cursor.expect_char('[')?;
            let low = cursor.read_number()?;
            cursor.expect_char('.')?;
            cursor.expect_char('.')?;
            let high = cursor.read_number()?;
            cursor.expect_char(']')?;
            let help = parse_optional_help(cursor)?;
            cursor.expect_char(';')?;
            let range = ValueRange::numeric(low, high).map_err(|e| cursor.err(e.to_string()))?;
            node.allowed_ranges.push((range, help));
        }
        "allow-operator" => {
            loop {
                cursor.skip_ws();
                if cursor.peek() == Some(';') {
                    break;
                }
                let op_text = if cursor.peek() == Some('"') {
                    cursor.read_quoted()?
                } else {
                    cursor.read_word()?
                };
                let op = op_text
                    .parse()
                    .map_err(|_| cursor.err(format!("unknown operator: {op_text}")))?;
                node.allowed_operators.push(op);
            }
            cursor.expect_char(';')?;
        }
        _ => {
            // A lifecycle/transaction command: %create, %set, %delete,
            // %activate, %update, %modinfo, or an application-defined name.
            cursor.expect_char(':')?;
            let body = cursor.read_until_semicolon_raw()?;
            let action = Action::parse(&body)?;
            insert_command(&mut node.commands, &name, action);
        }
    }

    Ok(())
}

fn insert_command(commands: &mut CommandSet, name: &str, action: Action) {
    commands.insert(name.to_string(), action);
}

fn parse_optional_help(cursor: &mut Cursor<'_>) -> Result<Option<String>, Error> {
    cursor.skip_ws();
    if cursor.peek() == Some('%') {
        let save = cursor.pos;
        cursor.pos += 1;
        let word = cursor.read_word()?;
        if word == "help" {
            return Ok(Some(cursor.read_quoted()?));
        }
        cursor.pos = save;
    }
    Ok(None)
}

// Strips the `$(...)` wrapper a reference is quoted with, e.g.
// `"$(protocols.ospf.router-id)"` -> `protocols.ospf.router-id`.
fn strip_var_ref(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("$(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(text)
        .to_string()
}

impl<'a> Cursor<'a> {
    fn read_quoted_terminated(&mut self) -> Result<String, Error> {
        let text = self.read_quoted()?;
        self.expect_char(';')?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leaf_with_default() {
        let mut root = TemplateNode::new_void("", "test");
        parse_into("mtu: u32 = 1500;", "t.tp", &mut root).unwrap();
        let mtu = root.find_child("mtu").unwrap();
        assert_eq!(mtu.kind, Some(ValueKind::UInt32));
        assert_eq!(mtu.default, Some(TypedValue::UInt32(1500)));
    }

    #[test]
    fn parses_tag_with_nested_block_and_commands() {
        let text = r#"
            interfaces {
                interface @: txt {
                    mtu: u32 = 1500;
                    %create: xrl "$(@.module)/1.0/create_interface?name:txt=$(@)";
                };
            };
        "#;
        let mut root = TemplateNode::new_void("", "test");
        parse_into(text, "t.tp", &mut root).unwrap();
        let interfaces = root.find_child("interfaces").unwrap();
        let interface = interfaces.find_child("interface").unwrap();
        assert!(interface.is_tag);
        assert!(interface.commands.has("create"));
        let mtu = interface.find_child("mtu").unwrap();
        assert_eq!(mtu.kind, Some(ValueKind::UInt32));
    }

    #[test]
    fn parses_flags_and_mandatory() {
        let text = r#"
            router-id: ipv4;
            area @: ipv4 {
                %mandatory "$(protocols.ospf.router-id)";
                %read-only "managed elsewhere";
            };
        "#;
        let mut root = TemplateNode::new_void("", "test");
        parse_into(text, "t.tp", &mut root).unwrap();
        let area = root.find_child("area").unwrap();
        assert_eq!(
            area.mandatory_config_nodes,
            vec!["protocols.ospf.router-id".to_string()]
        );
        assert_eq!(area.read_only.as_deref(), Some("managed elsewhere"));
    }

    #[test]
    fn parses_allow_and_allow_range() {
        let text = r#"
            mode: txt {
                %allow "active" %help "active mode";
                %allow "passive" %help "passive mode";
            };
            weight: u32 {
                %allow-range [0..100] %help "percentage";
            };
        "#;
        let mut root = TemplateNode::new_void("", "test");
        parse_into(text, "t.tp", &mut root).unwrap();
        let mode = root.find_child("mode").unwrap();
        assert_eq!(mode.allowed_values.len(), 2);
        let weight = root.find_child("weight").unwrap();
        assert_eq!(weight.allowed_ranges.len(), 1);
    }
}
