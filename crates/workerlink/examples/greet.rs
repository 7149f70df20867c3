//! Greeter worker: sends `greet` and prints the `ack` that comes back.
//!
//! Run with:
//!   cargo run -p workerlink --example greet --features logging -- --name Grace --log-level debug

use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use workerlink::logging::{init_logging, LogFormat, LogLevel};
use workerlink::value::Value;
use workerlink::{CallbackTable, ChannelBinder, CommandTable, TaggedPayload, ThreadWorker};

#[derive(Parser, Debug)]
#[command(name = "greet", about = "Send one greeting to a background worker")]
struct Args {
    /// Name to greet
    #[arg(long, default_value = "Ada")]
    name: String,

    /// Log output format
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log level
    #[arg(long, value_enum, value_name = "LEVEL", default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let (done_tx, done_rx) = mpsc::channel();
    let callbacks = CallbackTable::new().on("ack", move |arg: Value| {
        println!("ack: {}", arg.as_str().unwrap_or("<non-string>"));
        let _ = done_tx.send(());
    })?;

    let binder = ChannelBinder::new(
        || ThreadWorker::spawn(greeter),
        CommandTable::new(["greet"])?,
        callbacks,
    );
    binder.initialize()?;

    let commands = binder.commands();
    if let Some(greet) = commands.get("greet") {
        greet.call(Value::map([("name", args.name.as_str())]))?;
    }

    done_rx.recv_timeout(Duration::from_secs(5))?;
    binder.destroy();
    Ok(())
}

fn greeter(scope: workerlink::WorkerScope) {
    for message in scope.messages() {
        let Some(payload) = TaggedPayload::decode(&message) else {
            continue;
        };
        if payload.tag() != "greet" {
            continue;
        }
        let name = payload
            .arg()
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("stranger");
        let reply = TaggedPayload::new("ack", format!("hello {name}"));
        if scope.post_message(reply.into_value()).is_err() {
            break;
        }
    }
}
