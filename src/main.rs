//! Credit Audit - batch entry point for the explanation & fairness core
//!
//! Packages a pre-trained model into a versioned explainer artifact, runs
//! fairness audits over labeled evaluation sets and prints single-application
//! assessments.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ndarray::Array2;
use serde_json::Value;

use credit_risk_core::constants::{APP_NAME, APP_VERSION};
use credit_risk_core::logic::artifact::{self, ExplainerArtifact};
use credit_risk_core::logic::config::ExplainConfig;
use credit_risk_core::logic::dataset::EvalSet;
use credit_risk_core::logic::fairness::{FairnessAuditor, FairnessThresholds};
use credit_risk_core::logic::features::{FeatureLayout, FeatureScaler, FeatureVector, FeatureVectorBuilder};
use credit_risk_core::logic::model::ModelSpec;
use credit_risk_core::{CreditError, CreditResult};

#[derive(Debug, Parser)]
#[command(
    name = "credit-audit",
    version,
    about = "Explanation artifacts and fairness audits for credit-risk models"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Package a trained model, feature layout and background sample
    Package(PackageArgs),
    /// Audit group fairness over a labeled JSONL evaluation set
    Audit(AuditArgs),
    /// Assess and explain one encoded application
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
struct PackageArgs {
    /// Model JSON (tree ensemble or logistic)
    #[arg(long)]
    model: PathBuf,

    /// JSON list of feature names in model order
    #[arg(long)]
    layout: PathBuf,

    /// JSON array of background rows
    #[arg(long)]
    background: PathBuf,

    /// Optional standard-scaler parameters
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Artifact destination (defaults to CREDIT_ARTIFACT_PATH or the data dir)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct AuditArgs {
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// JSONL evaluation set
    #[arg(long)]
    eval: PathBuf,

    /// Write the structured report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the PASS bound
    #[arg(long)]
    pass: Option<f64>,

    /// Override the REVIEW bound
    #[arg(long)]
    review: Option<f64>,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Encoded application: JSON array in layout order or object of name → value
    #[arg(long)]
    instance: PathBuf,

    /// Print the full assessment as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Package(args) => run_package(&args),
        Command::Audit(args) => run_audit(&args),
        Command::Explain(args) => run_explain(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            if e.is_data_quality() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn artifact_path(arg: &Option<PathBuf>) -> PathBuf {
    arg.clone().unwrap_or_else(artifact::get_default_artifact_path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CreditResult<T> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

// ============================================================================
// PACKAGE
// ============================================================================

fn run_package(args: &PackageArgs) -> CreditResult<()> {
    let layout = FeatureLayout::new(read_json::<Vec<String>>(&args.layout)?)?;
    let model: ModelSpec = read_json(&args.model)?;

    let rows: Vec<Vec<f64>> = read_json(&args.background)?;
    let width = layout.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(CreditError::ShapeMismatch {
            expected: width,
            actual: row.len(),
            detail: format!("background row {}", i),
        });
    }
    let background = Array2::from_shape_vec((rows.len(), width), rows.concat())
        .map_err(|e| CreditError::InvalidBackground(e.to_string()))?;

    let mut packaged = ExplainerArtifact::new(layout, model, &background, ExplainConfig::from_env());
    if let Some(path) = &args.scaler {
        packaged = packaged.with_scaler(read_json::<FeatureScaler>(path)?);
    }
    artifact::validate_artifact(&packaged)?;

    // Fit once so a broken artifact never reaches disk
    let method = packaged.clone().into_explainer()?.method();
    let path = artifact_path(&args.output);
    artifact::save_artifact(&packaged, &path)?;

    println!("Artifact {} written to {}", packaged.id, path.display());
    if let Some(method) = method {
        println!("Attribution mode: {}", method.as_str());
    }
    Ok(())
}

// ============================================================================
// AUDIT
// ============================================================================

fn run_audit(args: &AuditArgs) -> CreditResult<()> {
    let loaded = artifact::load_artifact(&artifact_path(&args.artifact))?;
    let eval = EvalSet::load_jsonl(&args.eval, &loaded.layout)?;

    let defaults = loaded.config.fairness;
    let thresholds = FairnessThresholds::new(
        args.pass.unwrap_or(defaults.pass),
        args.review.unwrap_or(defaults.review),
    );

    let auditor = FairnessAuditor::new(&loaded.model, loaded.config.decision, thresholds)?;
    let report = auditor.audit(eval.features.view(), &eval.labels, &eval.partitions())?;

    print!("{}", report.summary());
    if let Some(path) = &args.output {
        report.save_json(path)?;
        println!("Report written to {}", path.display());
    }
    log::info!("Fairness audit {} complete: {}", report.id, report.verdict());
    Ok(())
}

// ============================================================================
// EXPLAIN
// ============================================================================

fn read_instance(path: &Path, layout: &FeatureLayout) -> CreditResult<FeatureVector> {
    let value: Value = read_json(path)?;
    match value {
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        CreditError::InvalidConfig(format!("non-numeric feature value {}", v))
                    })
                })
                .collect::<CreditResult<Vec<f64>>>()?;
            FeatureVector::from_layout(layout, values)
        }
        Value::Object(map) => {
            let mut builder = FeatureVectorBuilder::for_layout(layout);
            for name in layout.names() {
                let v = map.get(name).and_then(Value::as_f64).ok_or_else(|| {
                    CreditError::ShapeMismatch {
                        expected: layout.len(),
                        actual: map.len(),
                        detail: format!("missing or non-numeric feature '{}'", name),
                    }
                })?;
                builder = builder.set(name, v);
            }
            for (name, v) in &map {
                if layout.index_of(name).is_none() {
                    builder = builder.set(name, v.as_f64().unwrap_or(f64::NAN));
                }
            }
            Ok(builder.build())
        }
        _ => Err(CreditError::InvalidConfig(
            "instance must be a JSON array or object".to_string(),
        )),
    }
}

fn run_explain(args: &ExplainArgs) -> CreditResult<()> {
    let loaded = artifact::load_artifact(&artifact_path(&args.artifact))?;
    let instance = read_instance(&args.instance, &loaded.layout)?;
    let explainer = loaded.into_explainer()?;

    let assessment = explainer.assess(&instance)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!("{}", assessment.explainability.explanation_text);
    if let Some(notice) = &assessment.adverse_notice {
        println!("{}", notice);
    }
    if let Some(recommendations) = &assessment.recommendations {
        println!("{}", recommendations);
    }
    if let Some(insight) = &assessment.counterfactual_insight {
        println!("{}", insight);
    }
    if let Some(agreement) = &assessment.explainability.agreement {
        println!(
            "\nSurrogate agreement: overlap {:.2}, sign agreement {:.2}{}",
            agreement.overlap,
            agreement.sign_agreement,
            if assessment.explainability.low_agreement {
                " (LOW)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
