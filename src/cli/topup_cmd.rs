use anyhow::{Context, Result};

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::cli::selector::{self, SelectError};
use crate::core::config::AppConfig;
use crate::core::cost::topup::{quote, sorted_channels, validate_topup};
use crate::core::models::payment::{DiscountTable, PaymentChannel};

/// Pick the channel: explicit `--channel`, then the interactive picker when
/// requested, then the highest-sorted channel.
fn choose_channel<'a>(
    config: &'a AppConfig,
    channel_key: Option<&str>,
    pick: bool,
) -> Result<Option<&'a PaymentChannel>, SelectError> {
    if let Some(key) = channel_key {
        let found = config.find_channel(key);
        if found.is_none() {
            log::warn!("unknown payment channel '{}'", key);
        }
        return Ok(found);
    }

    let sorted = sorted_channels(&config.payments);
    if pick {
        let items = selector::build_selectable_list(&sorted);
        match selector::interactive_select(&items)? {
            Some(uuid) => return Ok(config.find_channel(&uuid)),
            None => log::debug!("not a terminal, falling back to default channel"),
        }
    }
    Ok(sorted.first().copied())
}

/// `None` when the user backed out of the picker; terminal errors propagate.
fn unless_cancelled<T>(selection: Result<T, SelectError>) -> Result<Option<T>> {
    match selection {
        Ok(value) => Ok(Some(value)),
        Err(SelectError::Cancelled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `qv topup <AMOUNT>`
pub fn run(
    raw_amount: &str,
    channel_key: Option<&str>,
    pick: bool,
    discounts_json: Option<&str>,
    config: &AppConfig,
    opts: &OutputOptions,
) -> Result<()> {
    let discounts = match discounts_json {
        Some(raw) => DiscountTable::from_json(raw).context("Invalid --discounts JSON")?,
        None => config.topup.discounts.clone(),
    };

    let Some(channel) = unless_cancelled(choose_channel(config, channel_key, pick))? else {
        eprintln!("Top-up cancelled.");
        return Ok(());
    };
    if let Some(c) = channel {
        log::debug!("using payment channel {}", c.uuid);
    }

    let amount = match validate_topup(raw_amount, config.topup.min_amount, channel) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    // validate_topup rejects a missing channel
    let Some(channel) = channel else {
        return Ok(());
    };

    let q = quote(amount, channel, &discounts, config.topup.usd_rate);

    match opts.format {
        OutputFormat::Text => println!("{}", renderer::render_topup_quote(&q, opts.use_color)),
        OutputFormat::Json => println!("{}", opts.to_json(&q)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_channel_by_name() {
        let config = AppConfig::default();
        let channel = choose_channel(&config, Some("Alipay"), false).unwrap();
        assert_eq!(channel.unwrap().uuid, "alipay");
    }

    #[test]
    fn unknown_channel_is_none() {
        let config = AppConfig::default();
        assert!(choose_channel(&config, Some("paypal"), false).unwrap().is_none());
    }

    #[test]
    fn default_channel_is_highest_sort() {
        let config = AppConfig::default();
        let channel = choose_channel(&config, None, false).unwrap();
        assert_eq!(channel.unwrap().uuid, "stripe");
    }

    #[test]
    fn no_channels_configured() {
        let config = AppConfig {
            payments: Vec::new(),
            ..AppConfig::default()
        };
        assert!(choose_channel(&config, None, false).unwrap().is_none());
    }

    #[test]
    fn cancel_is_not_an_error_but_io_failure_is() {
        assert!(unless_cancelled::<()>(Err(SelectError::Cancelled))
            .unwrap()
            .is_none());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no tty");
        let err = unless_cancelled::<()>(Err(SelectError::Io(io))).unwrap_err();
        assert!(err.to_string().contains("no tty"));
    }
}
