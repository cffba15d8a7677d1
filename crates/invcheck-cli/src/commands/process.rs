//! Process command - reconstruct and verify a single invoice.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invcheck_core::{AssemblyResult, Document, InvoiceAssembler};

use super::input::load_document;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input token file (JSON or Tesseract TSV)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Outcome of an external seal/signature detector
    #[arg(long)]
    seal_and_sign: Option<bool>,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Loading tokens...");

    let document = load_document(&args.input)?;

    pb.set_message("Reconstructing invoice...");
    let assembler = InvoiceAssembler::with_config(config);
    let result = process_document(&assembler, &document, args.seal_and_sign)?;

    pb.finish_and_clear();

    if !result.report.summary.issues.is_empty() {
        eprintln!("{}", style("Verification issues:").yellow());
        for issue in &result.report.summary.issues {
            eprintln!("  - {}", issue);
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!("{} Field confidence:", style("ℹ").blue());
        for (field, check) in &result.report.field_verification {
            let marker = if check.present { style("✓").green() } else { style("✗").red() };
            println!("  {} {:<24} {:>5.1}%", marker, field, check.confidence * 100.0);
        }
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the pipeline, folding in an external seal/signature verdict when given.
pub fn process_document(
    assembler: &InvoiceAssembler,
    document: &Document,
    seal_and_sign: Option<bool>,
) -> anyhow::Result<AssemblyResult> {
    let mut result = assembler.process(document)?;
    if let Some(present) = seal_and_sign {
        result.record.set_seal_and_sign_present(present);
        result.report = assembler.verify(&result.record, document);
    }
    Ok(result)
}

/// Load and process one token file.
pub fn process_file(assembler: &InvoiceAssembler, path: &Path) -> anyhow::Result<AssemblyResult> {
    let document = load_document(path)?;
    process_document(assembler, &document, None)
}

pub fn format_result(result: &AssemblyResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &AssemblyResult) -> anyhow::Result<String> {
    let record = &result.record;
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_number",
        "invoice_date",
        "row",
        "serial_number",
        "description",
        "hsn_sac",
        "quantity",
        "unit_price",
        "total_amount",
        "net_worth",
        "vat",
        "line_total_valid",
    ])?;

    for (i, item) in record.table_contents.iter().enumerate() {
        let valid = result
            .report
            .line_items_verification
            .get(i)
            .map(|v| v.line_total_check.check_passed.to_string())
            .unwrap_or_default();

        wtr.write_record([
            &record.general_information.invoice_number,
            &record.general_information.invoice_date,
            &(i + 1).to_string(),
            &item.serial_number,
            &item.description,
            &item.hsn_sac,
            &item.quantity.to_string(),
            &item.unit_price.to_string(),
            &item.total_amount.to_string(),
            &item.net_worth.map(|v| v.to_string()).unwrap_or_default(),
            &item.vat.map(|v| v.to_string()).unwrap_or_default(),
            &valid,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &AssemblyResult) -> String {
    let record = &result.record;
    let general = &record.general_information;
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", general.invoice_number));
    output.push_str(&format!("Date: {}\n", general.invoice_date));
    if general.po_number != invcheck_core::NOT_FOUND {
        output.push_str(&format!("PO: {}\n", general.po_number));
    }
    output.push('\n');

    output.push_str("Vendor:\n");
    output.push_str(&format!("  {}\n", record.vendor_information.name));
    output.push_str(&format!("  {}\n", record.vendor_information.address));
    output.push_str(&format!("  GST: {}\n", general.supplier_gst_number));
    output.push('\n');

    output.push_str("Customer:\n");
    output.push_str(&format!("  {}\n", record.customer_information.name));
    output.push_str(&format!("  {}\n", record.customer_information.address));
    output.push('\n');

    output.push_str(&format!("Line items ({}):\n", record.table_contents.len()));
    for item in &record.table_contents {
        output.push_str(&format!(
            "  {} x {} = {}  {}\n",
            item.quantity, item.unit_price, item.total_amount, item.description
        ));
    }
    output.push('\n');

    output.push_str("Totals:\n");
    output.push_str(&format!("  Subtotal: {}\n", record.totals.subtotal));
    output.push_str(&format!("  Discount: {}\n", record.totals.discount));
    output.push_str(&format!("  GST:      {}\n", record.totals.gst));
    output.push_str(&format!("  Total:    {}\n", record.totals.final_total));
    output.push('\n');

    let summary = &result.report.summary;
    output.push_str(&format!("All fields present: {}\n", summary.all_fields_present));
    output.push_str(&format!("All line items valid: {}\n", summary.all_line_items_valid));
    if summary.issues.is_empty() {
        output.push_str("Issues: none\n");
    } else {
        output.push_str("Issues:\n");
        for issue in &summary.issues {
            output.push_str(&format!("  - {}\n", issue));
        }
    }

    output
}
