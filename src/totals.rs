//! Cart Totals

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    bundles::calculator::PricedBundle, cart::Cart, pricing::TotalPriceError, products::ProductId,
    solvers::Selection,
};

/// Errors that can occur when totalling a cart.
#[derive(Debug, Error)]
pub enum TotalsError {
    /// Error calculating total price from cart lines.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// The priced outcome for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartTotals<'a> {
    subtotal: Money<'a, Currency>,
    item_count: u64,
    applied_discounts: SmallVec<[PricedBundle<'a>; 4]>,
    bundle_discount: Money<'a, Currency>,
    final_total: Money<'a, Currency>,
    currency: &'static Currency,
}

/// Combine a cart and the bundles selected for it into its totals.
///
/// # Errors
///
/// - [`TotalsError::TotalPrice`]: the cart subtotal could not be calculated.
/// - [`TotalsError::Money`]: the selection is in a different currency from the cart.
pub fn aggregate<'a>(
    cart: &Cart<'a>,
    selection: &Selection<'a>,
) -> Result<CartTotals<'a>, TotalsError> {
    let currency = cart.currency();
    let subtotal = cart.subtotal()?;
    let bundle_discount = *selection.total_discount();

    let remaining = subtotal.sub(bundle_discount)?;

    Ok(CartTotals {
        subtotal,
        item_count: cart.item_count(),
        applied_discounts: selection.applied().iter().cloned().collect(),
        bundle_discount,
        final_total: Money::from_minor(remaining.to_minor_units().max(0), currency),
        currency,
    })
}

impl<'a> CartTotals<'a> {
    /// Totals for an empty cart in the given currency.
    pub fn empty(currency: &'static Currency) -> Self {
        let zero = Money::from_minor(0, currency);

        Self {
            subtotal: zero,
            item_count: 0,
            applied_discounts: SmallVec::new(),
            bundle_discount: zero,
            final_total: zero,
            currency,
        }
    }

    /// Total cost before bundle discounts
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Number of units in the cart
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Bundles applied to the cart, largest discount first
    pub fn applied_discounts(&self) -> &[PricedBundle<'a>] {
        &self.applied_discounts
    }

    /// Sum of the applied bundle discounts
    pub fn bundle_discount(&self) -> Money<'a, Currency> {
        self.bundle_discount
    }

    /// Amount payable after bundle discounts
    pub fn final_total(&self) -> Money<'a, Currency> {
        self.final_total
    }

    /// Currency used for all monetary values
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Calculate the savings actually made on the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction operation fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.subtotal.sub(self.final_total)
    }

    /// Calculates the savings as a percentage of the subtotal
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction operation fails.
    pub fn savings_percent(&self) -> Result<Percentage, MoneyError> {
        let savings_minor = self.savings()?.to_minor_units();
        let subtotal_minor = self.subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Ok(Percentage::from(0.0));
        }

        let savings_dec = Decimal::from_i64(savings_minor).unwrap_or(Decimal::ZERO);
        let subtotal_dec = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ZERO);

        Ok(Percentage::from(savings_dec / subtotal_dec))
    }

    /// Prints the applied bundles and totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the totals cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), TotalsError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Bundle", "Kind", "Products", "Price", "Discount", "Bundle Price"]);

        for (idx, bundle) in self.applied_discounts.iter().enumerate() {
            let eligible = bundle.eligible();

            let products = eligible
                .footprint()
                .iter()
                .map(ProductId::as_str)
                .collect::<Vec<_>>()
                .join(", ");

            builder.push_record([
                format!("#{}", idx + 1),
                eligible.bundle().name().to_string(),
                eligible.bundle().discount_kind().to_string(),
                products,
                format!("{}", bundle.original_price()),
                format!("-{}", bundle.discount()),
                format!("{}", bundle.discounted_price()),
            ]);
        }

        if self.applied_discounts.is_empty() {
            builder.push_record(["", "No bundles applied", "", "", "", "", ""]);
        }

        write_totals_table(&mut out, builder)?;
        write_totals_summary(&mut out, self)
    }
}

fn write_totals_table(out: &mut impl io::Write, builder: Builder) -> Result<(), TotalsError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..7), Alignment::right());
    table.modify(Columns::new(5..6), Color::FG_GREEN);

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| TotalsError::IO)
}

fn write_totals_summary(out: &mut impl io::Write, totals: &CartTotals<'_>) -> Result<(), TotalsError> {
    let savings = totals.savings()?;
    let savings_percent_points = percent_points_from_fractional_percentage(totals.savings_percent()?);

    let items_label = " Items:";
    let subtotal_label = " Subtotal:";
    let total_label = " \x1b[1mTotal:\x1b[0m";
    let savings_label = " Savings:";

    let items_val = format!("{}  ", totals.item_count());
    let subtotal_val = format!("{}  ", totals.subtotal());
    let total_val = format!("{}  ", totals.final_total());
    let savings_val = format!("({savings_percent_points:.2}%) {savings}  ");

    let label_width = [items_label, subtotal_label, total_label, savings_label]
        .into_iter()
        .map(visible_width)
        .max()
        .unwrap_or_default();

    let value_width = [&items_val, &subtotal_val, &total_val, &savings_val]
        .into_iter()
        .map(String::len)
        .max()
        .unwrap_or_default();

    write_summary_line(out, items_label, &items_val, label_width, value_width)?;
    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    write_summary_line(out, savings_label, &savings_val, label_width, value_width)?;

    writeln!(out).map_err(|_err| TotalsError::IO)
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), TotalsError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| TotalsError::IO)
}
