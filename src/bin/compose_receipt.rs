//! Compose a Sample Receipt
//!
//! Assembles one of the reference documents on the worker pool and
//! optionally opens or shares it.
//!
//! Usage:
//!   cargo run --bin compose_receipt
//!   cargo run --bin compose_receipt -- --sample compact --documents-dir /tmp/docs
//!   cargo run --bin compose_receipt -- --config assembly.json --present
//!   cargo run --bin compose_receipt -- --share-with mail-client

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use receipt_composer::samples::{CompactReceipt, PaymentReceipt, TransactionStatement};
use receipt_composer::{
    create_and_dispatch, AssemblyConfig, AssemblyPool, CommandDispatcher, ContentProvider,
    DispatchMode,
};

struct ComposeArgs {
    sample: String,
    config: Option<PathBuf>,
    documents_dir: Option<PathBuf>,
    file_name: Option<String>,
    compress: bool,
    mode: Option<DispatchMode>,
    share_with: Option<String>,
}

impl ComposeArgs {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut parsed = Self {
            sample: "payment".to_string(),
            config: None,
            documents_dir: None,
            file_name: None,
            compress: false,
            mode: None,
            share_with: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--sample" => {
                    i += 1;
                    if let Some(value) = args.get(i) {
                        parsed.sample = value.clone();
                    }
                },
                "--config" => {
                    i += 1;
                    parsed.config = args.get(i).map(PathBuf::from);
                },
                "--documents-dir" => {
                    i += 1;
                    parsed.documents_dir = args.get(i).map(PathBuf::from);
                },
                "--file-name" => {
                    i += 1;
                    parsed.file_name = args.get(i).cloned();
                },
                "--compress" => parsed.compress = true,
                "--present" => parsed.mode = Some(DispatchMode::Present),
                "--share-with" => {
                    i += 1;
                    parsed.share_with = args.get(i).cloned();
                    parsed.mode = Some(DispatchMode::Share);
                },
                other => eprintln!("Ignoring unknown argument {}", other),
            }
            i += 1;
        }
        parsed
    }

    fn provider(&self, config: &AssemblyConfig) -> Option<Arc<dyn ContentProvider>> {
        match self.sample.as_str() {
            "payment" => Some(Arc::new(PaymentReceipt::default())),
            "compact" => Some(Arc::new(CompactReceipt::default())),
            "statement" => {
                let rows = [
                    ["1001", "402118", "₹5000", "₹50", "Success"],
                    ["1002", "402119", "₹3000", "₹25", "Success"],
                    ["1003", "402120", "₹1200", "₹10", "Failed"],
                ];
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect();
                Some(Arc::new(TransactionStatement::new(rows, config.currency.clone())))
            },
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = ComposeArgs::from_args();

    let mut config = match &args.config {
        Some(path) => match AssemblyConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Cannot load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => AssemblyConfig::default(),
    };
    if let Some(dir) = &args.documents_dir {
        config = config.with_documents_dir(dir);
    }
    if let Some(name) = &args.file_name {
        config = config.with_file_name(name);
    }
    if args.compress {
        config = config.with_compress(true);
    }

    let Some(provider) = args.provider(&config) else {
        eprintln!("Unknown sample {:?} (expected payment, compact or statement)", args.sample);
        return ExitCode::FAILURE;
    };

    let pool = match AssemblyPool::from_config(&config) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Cannot start workers: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let start = Instant::now();
    let result = match args.mode {
        Some(mode) => {
            let mut dispatcher = CommandDispatcher::system_default();
            if let Some(program) = &args.share_with {
                dispatcher = dispatcher.with_share_target(program.as_str(), [] as [&str; 0]);
            }
            create_and_dispatch(&pool, config, provider, &dispatcher, mode).map(|outcome| {
                if let Some(notice) = outcome.notice {
                    eprintln!("{}", notice);
                }
                outcome.artifact
            })
        },
        None => pool.submit(config, provider).and_then(|handle| handle.wait()),
    };
    pool.shutdown();

    match result {
        Ok(artifact) => {
            println!(
                "Wrote {} ({} pages, {} blocks, {} bytes) in {:.1?}",
                artifact.path.display(),
                artifact.page_count,
                artifact.block_count,
                artifact.len(),
                start.elapsed()
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Assembly failed: {}", e);
            ExitCode::FAILURE
        },
    }
}
