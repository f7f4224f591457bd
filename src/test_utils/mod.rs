//! Test utilities for the collector
//!
//! Scripted command runners and archive stream builders shared by the unit
//! test modules.

#![cfg(test)]

use std::fs::File;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tar::{EntryType, Header};

use crate::exec::{split_output_lines, Command, CommandRunner, StdoutConsumer};
use crate::logging::WarningSink;

#[derive(Clone)]
enum Behavior {
    Fail(String),
    Lines(Vec<String>),
    Output(Vec<u8>),
}

/// A [`CommandRunner`] that answers from a script and records every call.
///
/// Rules match when the command's display form contains the rule's pattern;
/// the first matching rule wins. Unmatched commands succeed, writing
/// `"<command>\n"` to any output file and producing an empty stdout stream.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Behavior)>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, pattern: &str, message: &str) -> Self {
        self.rules.push((pattern.to_string(), Behavior::Fail(message.to_string())));
        self
    }

    pub fn with_lines(mut self, pattern: &str, lines: Vec<&str>) -> Self {
        let lines = lines.into_iter().map(str::to_string).collect();
        self.rules.push((pattern.to_string(), Behavior::Lines(lines)));
        self
    }

    pub fn with_output(mut self, pattern: &str, output: Vec<u8>) -> Self {
        self.rules.push((pattern.to_string(), Behavior::Output(output)));
        self
    }

    /// Display forms of every command run so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose display form contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    fn behavior(&self, cmd: &Command) -> Option<Behavior> {
        let call = cmd.to_string();
        self.calls.lock().unwrap().push(call.clone());
        self.rules
            .iter()
            .find(|(pattern, _)| call.contains(pattern.as_str()))
            .map(|(_, behavior)| behavior.clone())
    }
}

#[async_trait::async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, cmd: &Command, output: Option<&File>) -> Result<()> {
        let data = match self.behavior(cmd) {
            Some(Behavior::Fail(msg)) => return Err(anyhow!(msg)),
            Some(Behavior::Output(data)) => data,
            Some(Behavior::Lines(lines)) => lines.join("\n").into_bytes(),
            None => format!("{}\n", cmd).into_bytes(),
        };
        if let Some(mut file) = output {
            file.write_all(&data)?;
        }
        Ok(())
    }

    async fn output_lines(&self, cmd: &Command) -> Result<Vec<String>> {
        match self.behavior(cmd) {
            Some(Behavior::Fail(msg)) => Err(anyhow!(msg)),
            Some(Behavior::Lines(lines)) => Ok(lines),
            Some(Behavior::Output(data)) => Ok(split_output_lines(&data)),
            None => Ok(Vec::new()),
        }
    }

    async fn run_with_stdout_reader(&self, cmd: &Command, consumer: StdoutConsumer) -> Result<()> {
        let data = match self.behavior(cmd) {
            Some(Behavior::Fail(msg)) => return Err(anyhow!(msg)),
            Some(Behavior::Output(data)) => data,
            Some(Behavior::Lines(lines)) => lines.join("\n").into_bytes(),
            None => Vec::new(),
        };
        consumer(&mut Cursor::new(data))
    }
}

/// Records warnings for later assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl WarningSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Builds in-memory tar streams entry by entry.
pub struct ArchiveFixture {
    builder: tar::Builder<Vec<u8>>,
}

impl ArchiveFixture {
    pub fn new() -> Self {
        Self { builder: tar::Builder::new(Vec::new()) }
    }

    pub fn dir(mut self, path: &str, mode: u32) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_mode(mode);
        header.set_size(0);
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    pub fn file(mut self, path: &str, mode: u32, data: &[u8]) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_mode(mode);
        header.set_size(data.len() as u64);
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_mode(0o777);
        header.set_size(0);
        header.set_link_name(target).unwrap();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

/// A stream holding one regular file header that declares `declared` bytes
/// but is cut off after `data`.
pub fn truncated_file_stream(path: &str, declared: u64, data: &[u8]) -> Vec<u8> {
    let mut header = Header::new_ustar();
    header.set_path(path).unwrap();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o644);
    header.set_size(declared);
    header.set_cksum();

    let mut stream = header.as_bytes().to_vec();
    stream.extend_from_slice(data);
    stream
}
