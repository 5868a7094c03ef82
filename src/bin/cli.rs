//! Stocktake CLI
//!
//! Command-line interface for Stocktake operations:
//! - Manage the catalog and record movements and sales
//! - Submit variance reports and decide special outbound requests
//! - Validate pasted product codes and export data
//! - Calculate a variance offline

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use stocktake::config::Config;
use stocktake::variance::{assess, Thresholds, VarianceInputs};

#[derive(Parser)]
#[command(name = "stocktake-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inventory and sales tracking for a small shop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the product catalog
    Products,

    /// Add a product
    AddProduct {
        /// Product code (e.g. SP001)
        code: String,
        /// Product name
        name: String,
        /// Unit of measure
        #[arg(short, long, default_value = "cái")]
        unit: String,
        #[arg(short, long, default_value = "")]
        category: String,
        /// Unit price
        #[arg(short, long, default_value = "0")]
        price: f64,
    },

    /// Record goods received
    Inbound {
        /// Product code
        product: String,
        quantity: f64,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Record goods dispatched, or request a special outbound with --special
    Outbound {
        /// Product code
        product: String,
        quantity: f64,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Submit as a special outbound request needing approval
        #[arg(long)]
        special: bool,
        /// Reason (required with --special)
        #[arg(short, long)]
        reason: Option<String>,
        /// Requester name (required with --special)
        #[arg(long)]
        by: Option<String>,
    },

    /// Record a sale
    Sale {
        /// Product code
        product: String,
        quantity: f64,
        /// Units given away under a promotion
        #[arg(long, default_value = "0")]
        promotion: f64,
        /// Unit price (default: product price)
        #[arg(short, long)]
        price: Option<f64>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        customer: Option<String>,
    },

    /// Calculate a variance offline (no server needed)
    ///
    /// Severity thresholds come from the [variance] section of the config file.
    #[command(allow_negative_numbers = true)]
    Calc {
        #[arg(long, default_value = "0")]
        beginning: f64,
        #[arg(long, default_value = "0")]
        inbound: f64,
        #[arg(long, default_value = "0")]
        sales: f64,
        #[arg(long, default_value = "0")]
        promotion: f64,
        #[arg(long, default_value = "0")]
        special: f64,
        #[arg(long)]
        actual: f64,
        /// Config file (default: standard search paths)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Submit a variance report; omitted quantities are prefilled from recorded data
    Report {
        /// Product code
        product: String,
        /// Counted stock
        #[arg(long)]
        actual: f64,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        beginning: Option<f64>,
        #[arg(long)]
        inbound: Option<f64>,
        #[arg(long)]
        sales: Option<f64>,
        #[arg(long)]
        promotion: Option<f64>,
        #[arg(long)]
        special: Option<f64>,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Approve a pending special outbound
    Approve {
        id: u32,
        /// Approver name
        #[arg(long)]
        by: String,
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Reject a pending special outbound
    Reject {
        id: u32,
        /// Approver name
        #[arg(long)]
        by: String,
        #[arg(short, long)]
        reason: String,
    },

    /// Validate product codes from a pasted-text file ("-" for stdin)
    Validate { file: PathBuf },

    /// Export a dataset
    Export {
        /// products, inventory, sales, special_outbound or variance
        dataset: String,
        /// csv or json
        #[arg(long, default_value = "csv")]
        as_format: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct Api {
    client: reqwest::Client,
    base: String,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base.trim_end_matches('/'), path)
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self.client.get(self.url(path)).send().await?;
        read_json(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        read_json(response).await
    }

    /// Look up a product id by its code
    async fn product_id(&self, code: &str) -> anyhow::Result<u64> {
        let response = self
            .client
            .get(self.url("/products"))
            .query(&[("code", code.trim())])
            .send()
            .await?;
        let found = read_json(response).await?;
        found["items"][0]["id"]
            .as_u64()
            .with_context(|| format!("Unknown product code {}", code.trim().to_uppercase()))
    }
}

/// Thresholds from an explicit config file, else the default search paths
fn calc_thresholds(path: Option<&Path>) -> anyhow::Result<Thresholds> {
    let config = match path {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    Ok(config.variance.thresholds())
}

/// Parse a JSON body, turning API errors into a readable message
async fn read_json(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| {
                let error = &v["error"];
                Some(format!(
                    "{} ({})",
                    error["user_message"].as_str()?,
                    error["message"].as_str().unwrap_or_default()
                ))
            })
            .unwrap_or(text);
        bail!("Request failed ({}): {}", status, detail);
    }

    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = Api {
        client: reqwest::Client::new(),
        base: cli.api_url.clone(),
    };
    let as_json = cli.format == "json";
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Products => {
            let products = api.get("/products").await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&products)?);
            } else {
                print_products(&products);
            }
        }

        Commands::AddProduct {
            code,
            name,
            unit,
            category,
            price,
        } => {
            let product = api
                .post(
                    "/products",
                    &json!({
                        "code": code,
                        "name": name,
                        "unit": unit,
                        "category": category,
                        "unit_price": price,
                    }),
                )
                .await?;
            println!(
                "Created product {} (id {})",
                product["code"].as_str().unwrap_or("-"),
                product["id"]
            );
        }

        Commands::Inbound {
            product,
            quantity,
            date,
            note,
        } => {
            let product_id = api.product_id(&product).await?;
            let record = api
                .post(
                    "/inventory",
                    &json!({
                        "product_id": product_id,
                        "record_date": date.unwrap_or(today),
                        "movement": "inbound",
                        "quantity": quantity,
                        "note": note,
                    }),
                )
                .await?;
            println!("Recorded inbound #{}: {} x {}", record["id"], product, quantity);
        }

        Commands::Outbound {
            product,
            quantity,
            date,
            special,
            reason,
            by,
        } => {
            let product_id = api.product_id(&product).await?;
            let date = date.unwrap_or(today);

            if special {
                let (Some(reason), Some(by)) = (reason, by) else {
                    bail!("--special requires --reason and --by");
                };
                let record = api
                    .post(
                        "/special-outbound",
                        &json!({
                            "product_id": product_id,
                            "outbound_date": date,
                            "quantity": quantity,
                            "reason": reason,
                            "requested_by": by,
                        }),
                    )
                    .await?;
                println!(
                    "Special outbound #{} submitted, awaiting approval",
                    record["id"]
                );
            } else {
                let record = api
                    .post(
                        "/inventory",
                        &json!({
                            "product_id": product_id,
                            "record_date": date,
                            "movement": "outbound",
                            "quantity": quantity,
                            "note": reason,
                        }),
                    )
                    .await?;
                println!("Recorded outbound #{}: {} x {}", record["id"], product, quantity);
            }
        }

        Commands::Sale {
            product,
            quantity,
            promotion,
            price,
            date,
            customer,
        } => {
            let product_id = api.product_id(&product).await?;
            let record = api
                .post(
                    "/sales",
                    &json!({
                        "product_id": product_id,
                        "sale_date": date.unwrap_or(today),
                        "quantity": quantity,
                        "promotion_quantity": promotion,
                        "unit_price": price,
                        "customer": customer,
                    }),
                )
                .await?;
            println!(
                "Recorded sale #{}: {} x {} at {}",
                record["id"], product, quantity, record["unit_price"]
            );
        }

        Commands::Calc {
            beginning,
            inbound,
            sales,
            promotion,
            special,
            actual,
            config,
        } => {
            let thresholds = calc_thresholds(config.as_deref())?;
            let inputs = VarianceInputs {
                beginning_inventory: beginning,
                inbound_quantity: inbound,
                sales_quantity: sales,
                promotion_quantity: promotion,
                special_outbound_quantity: special,
                actual_inventory: actual,
            };
            let assessment = assess(&inputs, &thresholds);

            if as_json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                println!("Book inventory:  {}", assessment.figures.book_inventory);
                println!("Actual:          {}", actual);
                println!("Variance:        {}", assessment.figures.variance);
                println!(
                    "Variance %:      {:.2}%",
                    assessment.figures.variance_percentage
                );
                println!("Severity:        {}", assessment.severity);
                if let Some(correction) = &assessment.suggested_correction {
                    println!();
                    println!("Suggested special outbound: {}", correction.quantity);
                    println!("  {}", correction.reason);
                }
            }
        }

        Commands::Report {
            product,
            actual,
            date,
            beginning,
            inbound,
            sales,
            promotion,
            special,
            note,
        } => {
            let product_id = api.product_id(&product).await?;
            let date = date.unwrap_or(today);

            let prefill = api
                .get(&format!(
                    "/variance/prefill?product_id={}&date={}",
                    product_id, date
                ))
                .await?;
            let field = |given: Option<f64>, name: &str| {
                given.unwrap_or_else(|| prefill[name].as_f64().unwrap_or(0.0))
            };

            let report = api
                .post(
                    "/variance",
                    &json!({
                        "product_id": product_id,
                        "report_date": date,
                        "beginning_inventory": field(beginning, "beginning_inventory"),
                        "inbound_quantity": field(inbound, "inbound_quantity"),
                        "sales_quantity": field(sales, "sales_quantity"),
                        "promotion_quantity": field(promotion, "promotion_quantity"),
                        "special_outbound_quantity": field(special, "special_outbound_quantity"),
                        "actual_inventory": actual,
                        "note": note,
                    }),
                )
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Variance report #{} for {} on {}", report["id"], product, date);
                println!("  Book inventory: {}", report["book_inventory"]);
                println!("  Variance:       {}", report["variance"]);
                println!(
                    "  Variance %:     {:.2}%",
                    report["variance_percentage"].as_f64().unwrap_or(0.0)
                );
                println!(
                    "  Severity:       {}",
                    report["severity"].as_str().unwrap_or("-")
                );
            }
        }

        Commands::Approve { id, by, comment } => {
            let record = api
                .post(
                    &format!("/special-outbound/{}/approve", id),
                    &json!({ "approver": by, "comment": comment }),
                )
                .await?;
            println!(
                "Special outbound #{} {}",
                id,
                record["status"].as_str().unwrap_or("-")
            );
        }

        Commands::Reject { id, by, reason } => {
            let record = api
                .post(
                    &format!("/special-outbound/{}/reject", id),
                    &json!({ "approver": by, "reason": reason }),
                )
                .await?;
            println!(
                "Special outbound #{} {}",
                id,
                record["status"].as_str().unwrap_or("-")
            );
        }

        Commands::Validate { file } => {
            let text = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {:?}", file))?
            };

            let report = api
                .post("/validation/product-codes", &json!({ "text": text }))
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_validation(&report);
            }
        }

        Commands::Export {
            dataset,
            as_format,
            start,
            end,
            output,
        } => {
            let mut query = vec![("dataset", dataset), ("format", as_format)];
            if let Some(start) = start {
                query.push(("start", start.to_string()));
            }
            if let Some(end) = end {
                query.push(("end", end.to_string()));
            }

            let response = api
                .client
                .get(api.url("/export"))
                .query(&query)
                .send()
                .await?;

            if !response.status().is_success() {
                read_json(response).await?;
                return Ok(());
            }
            let data = response.text().await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &data)?;
                    println!("Exported to {:?}", path);
                }
                None => {
                    print!("{}", data);
                }
            }
        }

        Commands::Status => {
            let response = api
                .client
                .get(format!("{}/health", cli.api_url.trim_end_matches('/')))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Stocktake v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Backend:    {}", health["backend"].as_str().unwrap_or("-"));
                    if health["fallback_active"].as_bool() == Some(true) {
                        println!("Warning:    backend failed, serving sample data");
                    }

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    bail!("API returned error: {}", resp.status());
                }
                Err(e) => {
                    eprintln!("Cannot connect to Stocktake API at {}", cli.api_url);
                    eprintln!();
                    eprintln!("Make sure the Stocktake API server is running:");
                    eprintln!("  cargo run --bin stocktake");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = stocktake::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_products(products: &Value) {
    let items = products["items"].as_array().cloned().unwrap_or_default();
    if items.is_empty() {
        println!("No products yet.");
        println!();
        println!("Add one with:");
        println!("  stocktake-cli add-product SP001 \"Trà xanh\" --unit hộp --price 45000");
        return;
    }

    println!(
        "{:<6} {:<10} {:<28} {:<8} {:>12} {}",
        "ID", "Code", "Name", "Unit", "Price", "Active"
    );
    println!("{}", "-".repeat(76));
    for p in items {
        println!(
            "{:<6} {:<10} {:<28} {:<8} {:>12} {}",
            p["id"].as_u64().unwrap_or(0),
            p["code"].as_str().unwrap_or("-"),
            p["name"].as_str().unwrap_or("-"),
            p["unit"].as_str().unwrap_or("-"),
            p["unit_price"].as_f64().unwrap_or(0.0),
            if p["active"].as_bool().unwrap_or(false) { "yes" } else { "no" }
        );
    }
}

fn print_validation(report: &Value) {
    let summary = &report["summary"];
    println!(
        "{} lines: {} valid, {} invalid",
        summary["total"], summary["valid"], summary["invalid"]
    );

    for entry in report["entries"].as_array().into_iter().flatten() {
        let status = entry["status"].as_str().unwrap_or("-");
        if status == "valid" {
            continue;
        }
        let suggestions: Vec<&str> = entry["suggestions"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s.as_str())
            .collect();
        print!(
            "  line {:<4} {:<12} {}",
            entry["line_number"],
            entry["code"].as_str().unwrap_or("-"),
            status
        );
        if !suggestions.is_empty() {
            print!(" (did you mean {}?)", suggestions.join(", "));
        }
        println!();
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "stocktake-cli",
            "calc",
            "--beginning",
            "100",
            "--actual",
            "95",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Calc { actual, .. } if actual == 95.0));
        assert_eq!(cli.api_url, "http://localhost:8090");
    }

    #[test]
    fn test_calc_accepts_negative_inputs() {
        let cli = Cli::try_parse_from([
            "stocktake-cli",
            "calc",
            "--inbound",
            "-5",
            "--actual",
            "-2",
        ])
        .unwrap();
        match cli.command {
            Commands::Calc { inbound, actual, .. } => {
                assert_eq!(inbound, -5.0);
                assert_eq!(actual, -2.0);
            }
            _ => panic!("expected calc command"),
        }
    }

    #[test]
    fn test_calc_thresholds_from_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[variance]\nhigh_threshold = 20.0\nmedium_threshold = 8.0\n",
        )
        .unwrap();

        let thresholds = calc_thresholds(Some(&path)).unwrap();
        assert_eq!(thresholds.high, 20.0);
        assert_eq!(thresholds.medium, 8.0);
        assert!(calc_thresholds(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_report_date_parses() {
        let cli = Cli::try_parse_from([
            "stocktake-cli",
            "report",
            "SP001",
            "--actual",
            "10",
            "--date",
            "2024-01-02",
        ])
        .unwrap();
        match cli.command {
            Commands::Report { date, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2));
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(3700), "1h 1m");
        assert_eq!(format_duration(90000), "1d 1h");
    }
}
