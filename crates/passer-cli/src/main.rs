use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use passer_core::app::BuildError;
use passer_core::{
    BincodeCodec, Codec, Context, DoneReason, ExecuteError, JsonCodec, PasserError,
    RegistryBuilder, RegistryConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CodecKind {
    Json,
    Bincode,
}

/// Encode a payload into an envelope and execute it against a registry.
#[derive(Debug, Parser)]
#[command(name = "passer", version)]
struct Args {
    /// Body codec used for both encode and execute.
    #[arg(long, value_enum, default_value_t = CodecKind::Json)]
    codec: CodecKind,

    /// Execute deadline in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Simulated handler work in milliseconds.
    #[arg(long, default_value_t = 0)]
    work_ms: u64,

    /// Payload key; the handler answers with "<key>+result".
    #[arg(long, default_value = "haha")]
    key: String,

    /// Reject duplicate handler registrations instead of replacing them.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ptype {
    key: String,
}

#[derive(Debug, Clone, Serialize)]
struct Presult {
    key: String,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("interrupted while working: {0}")]
    Interrupted(DoneReason),
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Passer(#[from] PasserError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Execute(#[from] ExecuteError<DemoError>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// handler：少し働いてから key に "+result" を付ける。ctx が終わったら途中でやめる
async fn append_result(ctx: Context, payload: Ptype, work: Duration) -> Result<Presult, DemoError> {
    tokio::select! {
        reason = ctx.done() => Err(DemoError::Interrupted(reason)),
        _ = tokio::time::sleep(work) => Ok(Presult {
            key: format!("{}+result", payload.key),
        }),
    }
}

async fn run<C: Codec>(codec: C, args: &Args) -> Result<(), CliError> {
    let config = if args.strict {
        RegistryConfig::strict()
    } else {
        RegistryConfig::default()
    };
    let work = Duration::from_millis(args.work_ms);

    // (A) Registry を組み立てる
    let registry = RegistryBuilder::<Presult, DemoError, C>::with_codec(codec)
        .config(config)
        .register::<Ptype, _>(move |ctx: Context, p: Ptype| append_result(ctx, p, work))?
        .expect::<Ptype>()
        .build()?;
    info!(codec = registry.codec().name(), types = ?registry.registered_types(), "registry ready");

    // (B) envelope を作る
    let data = registry.encode(&Ptype {
        key: args.key.clone(),
    })?;
    info!(envelope_len = data.len(), "encoded");

    // (C) 期限付きで実行
    let ctx = Context::background().with_timeout(Duration::from_millis(args.timeout_ms));
    let result = registry.execute(&ctx, &data).await;

    println!("counts: {}", serde_json::to_string(&registry.counts())?);
    let out = result?;
    println!("result: {}", serde_json::to_string(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let result = match args.codec {
        CodecKind::Json => run(JsonCodec, &args).await,
        CodecKind::Bincode => run(BincodeCodec, &args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
