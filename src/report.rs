//! Terminal and text rendering of results.

use crate::data::DataSummary;
use crate::engine::SimulationReport;
use crate::optimizer::OptimizationReport;
use crate::types::SimulationResult;
use colored::Colorize;
use tabled::{builder::Builder, settings::Style};

/// Result formatter for display.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Print a single-run report to stdout.
    pub fn print_report(report: &SimulationReport) {
        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", " SIMULATION RESULTS ".bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        println!("{}", "Overview".bold().underline());
        println!("  Parameters:      {}", report.params);
        println!(
            "  Period:          {} to {}",
            report.start_date, report.end_date
        );
        println!("  Trading Days:    {}", report.trading_days);
        println!("  Buy Days:        {}", report.buy_days);
        println!("  Sell Days:       {}", report.sell_days);
        println!();

        Self::print_result_block(&report.result);
        println!("{}", "═".repeat(60).blue());
    }

    /// Print the terminal numbers of a run.
    pub fn print_result_block(result: &SimulationResult) {
        println!("{}", "Performance".bold().underline());
        println!(
            "  Final Value:     {:>12.2}",
            result.final_portfolio_value
        );
        println!("  Cash Invested:   {:>12.2}", result.cash_invested);
        println!(
            "  Profit:          {:>12}",
            Self::format_signed(result.profit)
        );
        println!();
    }

    /// Print a sweep: ranked trial table, failures, best combination.
    pub fn print_optimization(report: &OptimizationReport, limit: usize) {
        let ranked = report.ranked();
        let shown = if limit > 0 && limit < ranked.len() {
            &ranked[..limit]
        } else {
            &ranked[..]
        };

        let mut builder = Builder::new();
        builder.push_record([
            "#", "FGI <", "Sell", "Final Value", "Invested", "Profit",
        ]);
        for trial in shown {
            builder.push_record([
                trial.index.to_string(),
                trial.params.fgi_buy_threshold.to_string(),
                format!("{:.2}", trial.params.sell_amount),
                format!("{:.2}", trial.result.final_portfolio_value),
                format!("{:.2}", trial.result.cash_invested),
                format!("{:.2}", trial.result.profit),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));

        if !report.failures.is_empty() {
            println!();
            println!("{}", "Failed Trials".bold().underline());
            for failure in &report.failures {
                println!(
                    "  #{} {}: {}",
                    failure.index,
                    failure.params,
                    failure.reason.red()
                );
            }
        }

        println!();
        match &report.best {
            Some(best) => {
                println!("{}", "Best Configuration".bold().green());
                println!("  FGI Threshold:   {:>12}", best.params.fgi_buy_threshold);
                println!("  Sell Amount:     {:>12.2}", best.params.sell_amount);
                Self::print_result_block(&best.result);
            }
            None => println!("{}", "No trial succeeded.".bold().red()),
        }

        if let Some(baseline) = &report.baseline {
            println!("{}", "Plain DCA Baseline".bold().underline());
            println!(
                "  Final Value:     {:>12.2}",
                baseline.final_portfolio_value
            );
            println!("  Cash Invested:   {:>12.2}", baseline.cash_invested);
            println!(
                "  Profit:          {:>12}",
                Self::format_signed(baseline.profit)
            );
            println!();
        }
    }

    /// Print a data summary.
    pub fn print_summary(summary: &DataSummary) {
        println!("\nData Summary:");
        println!("  Rows: {}", summary.rows);
        println!("  Start: {}", summary.start_date);
        println!("  End: {}", summary.end_date);
        println!(
            "  Price Range: {:.2} - {:.2}",
            summary.min_price, summary.max_price
        );
        println!("  Average Price: {:.2}", summary.avg_price);
        println!(
            "  FGI Range: {} - {} (avg {:.1})",
            summary.min_fgi, summary.max_fgi, summary.avg_fgi
        );
    }

    fn format_signed(value: f64) -> String {
        if value >= 0.0 {
            format!("{:+.2}", value).green().to_string()
        } else {
            format!("{:.2}", value).red().to_string()
        }
    }

    /// Export a result to JSON.
    pub fn to_json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get CSV header for a single result line.
    pub fn csv_header() -> &'static str {
        "investment_per_day,fgi_threshold,sell_amount,final_portfolio_value,cash_invested,profit"
    }

    /// Export a single run as a CSV line.
    pub fn to_csv_line(report: &SimulationReport) -> String {
        format!(
            "{},{},{},{:.2},{:.2},{:.2}",
            report.params.investment_per_day,
            report.params.fgi_buy_threshold,
            report.params.sell_amount,
            report.result.final_portfolio_value,
            report.result.cash_invested,
            report.result.profit
        )
    }
}
