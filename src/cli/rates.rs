use super::ui;
use crate::core::format::{format_amount, format_converted};
use crate::core::{ConversionItem, ConvertedAmount, RateConverter};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

fn date_label(date: Option<NaiveDate>) -> String {
    date.map_or("latest".to_string(), |d| d.to_string())
}

pub async fn show_rate(
    converter: &RateConverter,
    from: &str,
    to: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let rate = converter.try_get_rate(from, to, date).await;
    let rate_text = rate.map_or_else(
        || ui::style_text("N/A", ui::StyleType::Error),
        |r| ui::style_text(&format!("{r:.6}"), ui::StyleType::TotalValue),
    );

    println!(
        "1 {} = {} {} {}",
        ui::style_text(from, ui::StyleType::TotalLabel),
        rate_text,
        ui::style_text(to, ui::StyleType::TotalLabel),
        ui::style_text(&format!("({})", date_label(date)), ui::StyleType::Subtle)
    );
    Ok(())
}

pub async fn show_conversion(
    converter: &RateConverter,
    amount: f64,
    from: &str,
    to: &str,
    date: Option<NaiveDate>,
    locale: &str,
) -> Result<()> {
    match converter.try_convert(amount, from, to, date).await {
        Some(converted) => println!(
            "{} = {} {}",
            format_amount(amount, from, locale),
            ui::style_text(&format_converted(&converted, locale), ui::StyleType::TotalValue),
            ui::style_text(
                &format!("(rate {:.6}, {})", converted.exchange_rate, converted.rate_date),
                ui::StyleType::Subtle
            )
        ),
        None => println!(
            "{} = {}",
            format_amount(amount, from, locale),
            ui::style_text(
                &format!("N/A (no {from}/{to} rate available)"),
                ui::StyleType::Error
            )
        ),
    }
    Ok(())
}

fn conversions_table(
    items: &[ConversionItem],
    converted: &[Option<ConvertedAmount>],
    target: &str,
    locale: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Amount"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Value ({target})")),
    ]);

    for (item, result) in items.iter().zip(converted) {
        table.add_row(vec![
            Cell::new(format_amount(item.amount, &item.currency, locale)),
            ui::format_optional_cell(result.as_ref(), |c| format!("{:.6}", c.exchange_rate)),
            ui::format_optional_cell(result.as_ref(), |c| format_converted(c, locale)),
        ]);
    }

    let total: Option<f64> = converted
        .iter()
        .map(|c| c.as_ref().map(|c| c.converted_amount))
        .sum();
    let (total_text, total_style) = match total {
        Some(t) => (format_amount(t, target, locale), ui::StyleType::TotalValue),
        None => ("N/A".to_string(), ui::StyleType::Error),
    };

    format!(
        "{}\n\nTotal ({}): {}",
        table,
        ui::style_text(target, ui::StyleType::TotalLabel),
        ui::style_text(&total_text, total_style)
    )
}

pub async fn show_conversions(
    converter: &RateConverter,
    items: &[ConversionItem],
    target: &str,
    date: Option<NaiveDate>,
    locale: &str,
) -> Result<()> {
    let converted = converter.try_convert_many(items, target, date).await;
    println!(
        "{}\n",
        ui::style_text(
            &format!("Conversions to {target} ({})", date_label(date)),
            ui::StyleType::Title
        )
    );
    println!("{}", conversions_table(items, &converted, target, locale));
    Ok(())
}

pub async fn preload(converter: &RateConverter, currencies: &[String], base: &str) -> Result<()> {
    let pending = currencies.iter().filter(|c| c.as_str() != base).count();
    let pb = ui::new_progress_bar(pending as u64, true);
    pb.set_message("Preloading rates...");

    let loaded = converter
        .preload_rates_with_progress(currencies, base, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    println!(
        "Preloaded {} of {} rates into {}",
        ui::style_text(&loaded.to_string(), ui::StyleType::TotalValue),
        pending,
        ui::style_text(base, ui::StyleType::TotalLabel)
    );
    Ok(())
}

pub async fn clear_cache(converter: &RateConverter) -> Result<()> {
    converter.clear_cache().await;
    let scope = if converter.has_store() {
        "in-memory and persisted"
    } else {
        "in-memory"
    };
    println!("Cleared {scope} exchange rates");
    Ok(())
}
