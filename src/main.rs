// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context};
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

use palm_compute::computer::Computer;
use palm_compute::config::{load_and_validate_config, BackendType, Config, ContextConfig};
use palm_compute::context::ComputeContext;
use palm_compute::io::{ComputeClientTcp, ComputeServiceTcp, ComputeServiceTcpListener, ServiceEvent, ServiceEvents};
use palm_compute::model::{ComputeBatch, ComputeLambda};
use palm_compute::observability::init_tracing;

const DEFAULT_LOG_FILTER: &str = "info";

fn print_usage(program: &str) {
    eprintln!("Usage: {} run <program-file> <input> [--backend lua|wasm]", program);
    eprintln!("       {} serve [--config <file>] [port]", program);
    eprintln!("       {} compute [--config <file>] <host:port>", program);
    eprintln!("Example: {} run upper.lua \"hello world\"", program);
    eprintln!("Example: {} serve --config service.yaml 62001", program);
    eprintln!("Example: {} compute 127.0.0.1:62001", program);
}

#[tokio::main]
async fn main() {
    init_tracing(DEFAULT_LOG_FILTER);

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("palm-compute");
    let rest = args.get(2..).unwrap_or_default();

    let outcome = match args.get(1).map(String::as_str) {
        Some("run") => run_program(rest),
        Some("serve") => serve(rest).await,
        Some("compute") => compute(rest).await,
        _ => {
            print_usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

/// Splits `--name value` out of `args`, returning its value and the remaining
/// positional arguments.
fn take_option(args: &[String], name: &str) -> anyhow::Result<(Option<String>, Vec<String>)> {
    let mut value = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            let next = iter.next().ok_or_else(|| anyhow!("{} requires a value", name))?;
            value = Some(next.clone());
        } else {
            positional.push(arg.clone());
        }
    }
    Ok((value, positional))
}

fn load_optional_config(path: Option<String>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_and_validate_config(&path).with_context(|| format!("loading {}", path)),
        None => Ok(Config::default()),
    }
}

/// Registers a program as lambda 1 and runs the input through it once.
fn run_program(args: &[String]) -> anyhow::Result<()> {
    let (backend, positional) = take_option(args, "--backend")?;
    let [program_file, input] = positional.as_slice() else {
        bail!("run expects <program-file> <input>");
    };
    let backend = match backend {
        Some(name) => name.parse::<BackendType>().map_err(|e| anyhow!(e))?,
        None => BackendType::default(),
    };

    let program = fs::read_to_string(program_file).with_context(|| format!("reading {}", program_file))?;
    let context = ComputeContext::from_config(&ContextConfig::with_backend(backend))?;
    let mut logs = context.subscribe();

    println!("🚀 Running {} with the {} runtime", program_file, context.backend());
    let start = Instant::now();
    context.register(&ComputeLambda::new(1, program))?;
    let result = context.process(&ComputeBatch::new(1, 1, input.as_bytes().to_vec()));
    let elapsed = start.elapsed();

    for entry in logs.drain() {
        println!("📝 [{}] {}", entry.timestamp, entry.message);
    }
    let output = result?;
    println!("🎯 Output: \"{}\"", String::from_utf8_lossy(&output.data));
    println!("⏱️  Time: {:?}", elapsed);
    Ok(())
}

/// Accepts compute clients and hands each one the configured lambdas and batches.
async fn serve(args: &[String]) -> anyhow::Result<()> {
    let (config_file, positional) = take_option(args, "--config")?;
    let config = load_optional_config(config_file)?;
    let mut service = config.service;
    if let Some(port) = positional.first() {
        service.port = port.parse().with_context(|| format!("invalid port '{}'", port))?;
    }

    let address = format!("{}:{}", service.bind_address, service.port);
    let listener = ComputeServiceTcpListener::bind(&address, service.connection_options()).await?;
    let lambdas = Arc::new(service.lambdas);
    let batches = Arc::new(service.batches);

    loop {
        let (connection, events) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept compute client");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        let lambdas = Arc::clone(&lambdas);
        let batches = Arc::clone(&batches);
        tokio::spawn(async move {
            for seed in lambdas.iter() {
                if let Err(e) = connection.submit_lambda(ComputeLambda::new(seed.id, seed.program.clone())) {
                    tracing::warn!(peer = connection.peer(), error = %e, "Failed to submit lambda");
                }
            }
            for seed in batches.iter() {
                let batch = ComputeBatch::new(seed.lambda_id, seed.batch_id, seed.data.as_bytes().to_vec());
                if let Err(e) = connection.submit_batch(batch) {
                    tracing::warn!(peer = connection.peer(), error = %e, "Failed to submit batch");
                }
            }
            log_service_events(&connection, events).await;
        });
    }

    println!("👋 Service stopped");
    Ok(())
}

async fn log_service_events(connection: &ComputeServiceTcp, mut events: ServiceEvents) {
    let peer = connection.peer();
    while let Some(event) = events.recv().await {
        match event {
            ServiceEvent::Batch(batch) => tracing::info!(
                peer,
                lambda_id = batch.lambda_id,
                batch_id = batch.batch_id,
                output = %String::from_utf8_lossy(&batch.data),
                "Batch processed"
            ),
            ServiceEvent::Error(error) => tracing::warn!(peer, code = error.code(), "{}", error),
            ServiceEvent::LogEntry(entry) => tracing::info!(
                peer,
                lambda_id = entry.lambda_id,
                batch_id = entry.batch_id,
                "{}",
                entry.message
            ),
            ServiceEvent::Status(status) => tracing::debug!(peer, ?status, "Client status"),
            ServiceEvent::Exception(e) => tracing::warn!(peer, error = %e, "Bad frame from client"),
        }
    }
}

/// Runs a computer against a compute service until the service ends the connection.
async fn compute(args: &[String]) -> anyhow::Result<()> {
    let (config_file, positional) = take_option(args, "--config")?;
    let config = load_optional_config(config_file)?;
    let [address] = positional.as_slice() else {
        bail!("compute expects <host:port>");
    };

    let threads = config.computer.get_threads();
    let computer = Arc::new(Computer::from_config(&config.context, threads)?);
    let client = ComputeClientTcp::connect(
        address,
        config.client.connection_options(),
        config.client.connect_timeout(),
    )
    .await?;

    let closer = Arc::clone(&computer);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });

    println!("🚀 Computing for {} on {} contexts", address, computer.context_count());
    computer.run(Arc::new(client)).await?;

    let stats = computer.stats();
    println!(
        "🎉 Done: {} lambdas registered, {} batches processed",
        stats.lambda_count, stats.processed_batches
    );
    Ok(())
}
