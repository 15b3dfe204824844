//! # Resume Export CLI
//!
//! Usage:
//!   resume-export resume.json -o resume.pdf
//!   echo '{ ... }' | resume-export -o resume.pdf
//!   resume-export --example > resume.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;

use resume_export::{export_document, Document, ExportError, PageSize};

#[derive(Parser)]
#[command(name = "resume-export")]
#[command(version)]
#[command(about = "Export a resume document to a paginated PDF", long_about = None)]
struct Cli {
    /// Input document JSON (stdin if not specified)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(short, long, value_name = "FILE", default_value = "output.pdf")]
    output: PathBuf,

    /// Page size: a4, a3, a5, letter, legal
    #[arg(long)]
    page_size: Option<String>,

    /// Device pixels per CSS pixel when rasterizing
    #[arg(long)]
    pixel_density: Option<f64>,

    /// Extra space above a pushed block, in CSS pixels
    #[arg(long)]
    breathing_room: Option<f64>,

    /// Write the PDF as base64 text instead of binary
    #[arg(long)]
    base64: bool,

    /// Also save the re-flowed raster as a PNG
    #[arg(long, value_name = "FILE")]
    raster: Option<PathBuf>,

    /// Print the page-break report as JSON to stdout
    #[arg(long)]
    report: bool,

    /// Print an example resume document and exit
    #[arg(long)]
    example: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_resume_json());
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ExportError> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut document: Document = serde_json::from_str(&input)?;
    if let Some(size) = &cli.page_size {
        document.options.page_size = size.parse::<PageSize>()?;
    }
    if let Some(density) = cli.pixel_density {
        document.options.pixel_density = density;
    }
    if let Some(breathing) = cli.breathing_room {
        document.options.breathing_room = breathing;
    }

    let result = export_document(&document)?;

    if let Some(path) = &cli.raster {
        result
            .raster
            .save(path)
            .map_err(|e| ExportError::Rasterization(format!("failed to save {}: {}", path.display(), e)))?;
    }

    let bytes = if cli.base64 {
        result.to_base64().into_bytes()
    } else {
        result.to_bytes()
    };
    fs::write(&cli.output, &bytes)?;

    if cli.report {
        let report = serde_json::to_string_pretty(&result.report())?;
        println!("{}", report);
    }

    eprintln!(
        "✓ Written {} page(s), {} bytes to {}",
        result.total_pages,
        bytes.len(),
        cli.output.display()
    );
    Ok(())
}

fn example_resume_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Jordan Rivera",
    "author": "Jordan Rivera"
  },
  "options": {
    "pageSize": "a4",
    "breathingRoom": 20
  },
  "children": [
    {
      "kind": { "type": "View" },
      "style": { "padding": { "top": 32, "right": 40, "bottom": 16, "left": 40 } },
      "children": [
        {
          "kind": { "type": "Heading", "text": "Jordan Rivera" },
          "style": { "fontSize": 32, "color": { "r": 0.1, "g": 0.1, "b": 0.15 } }
        },
        {
          "kind": { "type": "Text", "content": "Backend engineer · Lisbon · jordan@example.com" },
          "style": { "fontSize": 12, "color": { "r": 0.4, "g": 0.4, "b": 0.4 } }
        }
      ]
    },
    { "kind": { "type": "Divider" } },
    {
      "kind": { "type": "Section", "title": "Experience" },
      "style": { "padding": { "top": 16, "right": 40, "bottom": 0, "left": 40 } },
      "children": [
        {
          "kind": { "type": "Entry" },
          "id": "job-1",
          "style": { "margin": { "top": 12, "right": 0, "bottom": 0, "left": 0 } },
          "children": [
            { "kind": { "type": "Text", "content": "Staff Engineer, Northwind Logistics (2021 to present)" }, "style": { "fontSize": 14 } },
            { "kind": { "type": "Text", "content": "Led the migration of the routing service to an event-driven architecture, cutting p99 latency by 60 percent and removing two legacy batch systems." } },
            { "kind": { "type": "Text", "content": "Designed the shipment tracking API used by 40 partner integrations." } }
          ]
        },
        {
          "kind": { "type": "Entry" },
          "id": "job-2",
          "style": { "margin": { "top": 12, "right": 0, "bottom": 0, "left": 0 } },
          "children": [
            { "kind": { "type": "Text", "content": "Senior Engineer, Contoso Payments (2017 to 2021)" }, "style": { "fontSize": 14 } },
            { "kind": { "type": "Text", "content": "Built the reconciliation pipeline that settles card transactions across three acquiring banks." } },
            { "kind": { "type": "Text", "content": "Mentored six engineers and ran the on-call rotation for the ledger team." } }
          ]
        },
        {
          "kind": { "type": "Entry" },
          "id": "job-3",
          "style": { "margin": { "top": 12, "right": 0, "bottom": 0, "left": 0 } },
          "children": [
            { "kind": { "type": "Text", "content": "Software Engineer, Fabrikam (2013 to 2017)" }, "style": { "fontSize": 14 } },
            { "kind": { "type": "Text", "content": "Maintained the inventory service and its reporting jobs." } }
          ]
        }
      ]
    },
    {
      "kind": { "type": "Section", "title": "Education" },
      "style": { "padding": { "top": 16, "right": 40, "bottom": 0, "left": 40 } },
      "children": [
        {
          "kind": { "type": "Entry" },
          "id": "edu-1",
          "style": { "margin": { "top": 12, "right": 0, "bottom": 0, "left": 0 } },
          "children": [
            { "kind": { "type": "Text", "content": "BSc Computer Science, University of Porto (2009 to 2013)" }, "style": { "fontSize": 14 } }
          ]
        }
      ]
    },
    {
      "kind": { "type": "Section", "title": "Skills" },
      "style": { "padding": { "top": 16, "right": 40, "bottom": 32, "left": 40 } },
      "children": [
        {
          "kind": { "type": "Entry" },
          "id": "skills-1",
          "children": [
            { "kind": { "type": "Text", "content": "Rust, Go, PostgreSQL, Kafka, Kubernetes, distributed tracing" } }
          ]
        }
      ]
    }
  ]
}
"##
}
