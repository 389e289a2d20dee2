#![allow(clippy::print_stdout)]

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Stdout belongs to command results. In JSON mode nothing is printed as it
/// is produced; values are collected here and emitted as one object.
struct Output {
    json: bool,
    fields: Map<String, Value>,
}

static OUTPUT: LazyLock<Mutex<Output>> = LazyLock::new(|| {
    Mutex::new(Output {
        json: false,
        fields: Map::new(),
    })
});

fn output() -> MutexGuard<'static, Output> {
    OUTPUT.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_json_mode(json: bool) {
    output().json = json;
}

pub fn json_mode() -> bool {
    output().json
}

pub fn print_output(printed_output: &str) {
    if !output().json {
        println!("{}", printed_output);
    }
}

pub fn set_json_output(key: &str, value: Value) {
    output().fields.insert(key.to_string(), value);
}

#[macro_export]
macro_rules! outln {
    ( $fmt:expr $(, $args:expr)*) => {
        $crate::util::print_output(&format!($fmt $(, $args)*))
    };
}

/// Records how the action ended and prints the collected object.
pub fn print_json_output(result: &Result<()>) -> Result<()> {
    let mut output = output();
    match result {
        Ok(()) => {
            output
                .fields
                .insert("status".to_string(), Value::from("success"));
        }
        Err(e) => {
            output
                .fields
                .insert("status".to_string(), Value::from("error"));
            output
                .fields
                .insert("error".to_string(), Value::from(format!("{:#}", e)));
        }
    }
    let document = Value::Object(output.fields.clone());
    println!(
        "{}",
        serde_json::to_string_pretty(&document)
            .context("Error serializing JSON")?
    );
    Ok(())
}
