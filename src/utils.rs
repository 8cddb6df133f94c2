use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn format_credit(amount: i64) -> String {
  format!("{amount} T")
}

fn too_large() -> Error {
  Error::InvalidArgs("Amount is too large.".into())
}

/// `balance + amount`, refusing results that do not fit a balance.
pub fn add_credit(balance: i64, amount: i64) -> Result<i64> {
  balance.checked_add(amount).ok_or_else(too_large)
}

pub fn sub_credit(balance: i64, amount: i64) -> Result<i64> {
  balance.checked_sub(amount).ok_or_else(too_large)
}

/// Loose phone check: `+98`, `0098` or `09` prefix, at least 10 chars,
/// digits only after an optional leading `+`.
pub fn is_valid_phone(input: &str) -> bool {
  let phone = input.trim();
  let digits = phone.strip_prefix('+').unwrap_or(phone);

  phone.len() >= 10
    && !digits.is_empty()
    && digits.chars().all(|c| c.is_ascii_digit())
    && (phone.starts_with("+98")
      || phone.starts_with("0098")
      || phone.starts_with("09"))
}

pub fn parse_id(input: &str) -> Result<i64> {
  input
    .trim()
    .parse::<i64>()
    .map_err(|_| Error::InvalidArgs("Invalid numeric ID.".into()))
}

/// Positive integer amount, as typed by a user.
pub fn parse_amount(input: &str) -> Result<i64> {
  let amount = input
    .trim()
    .replace(',', "")
    .parse::<i64>()
    .map_err(|_| Error::InvalidArgs("Invalid numeric amount.".into()))?;

  if amount <= 0 {
    return Err(Error::InvalidArgs("Amount must be positive.".into()));
  }
  Ok(amount)
}

/// `<user_id> <amount>` as used by the admin charge/deduct prompts.
pub fn parse_id_amount(input: &str) -> Result<(i64, i64)> {
  let parts: Vec<&str> = input.split_whitespace().collect();
  match parts.as_slice() {
    [id, amount] => Ok((parse_id(id)?, parse_amount(amount)?)),
    _ => Err(Error::InvalidArgs(
      "Wrong format. Example: <code>123456789 10000</code>".into(),
    )),
  }
}

/// Non-negative integer price.
pub fn parse_price(input: &str) -> Result<i64> {
  let price = input
    .trim()
    .replace(',', "")
    .parse::<i64>()
    .map_err(|_| Error::InvalidArgs("Invalid numeric price.".into()))?;

  if price < 0 {
    return Err(Error::InvalidArgs("Price cannot be negative.".into()));
  }
  Ok(price)
}

/// `<code> <value>` for new discount codes.
pub fn parse_code_value(input: &str) -> Result<(String, i64)> {
  let parts: Vec<&str> = input.split_whitespace().collect();
  match parts.as_slice() {
    [code, value] => Ok((code.to_string(), parse_amount(value)?)),
    _ => Err(Error::InvalidArgs(
      "Wrong format. Example: <code>vip50 5000</code>".into(),
    )),
  }
}

/// `<amount> - <description>`; the description may be omitted.
pub fn parse_topup(input: &str) -> Result<(i64, String)> {
  let (amount, description) = match input.split_once('-') {
    Some((amount, description)) => (amount, description.trim()),
    None => (input, ""),
  };
  Ok((parse_amount(amount)?, description.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_phone_check() {
    assert!(is_valid_phone("09123456789"));
    assert!(is_valid_phone("+989123456789"));
    assert!(is_valid_phone("00989123456789"));
    assert!(!is_valid_phone("0912"));
    assert!(!is_valid_phone("+15551234567"));
    assert!(!is_valid_phone("09abc456789"));
  }

  #[test]
  fn test_amount_rejects_non_positive() {
    assert_eq!(parse_amount(" 3000 ").unwrap(), 3000);
    assert_eq!(parse_amount("100,000").unwrap(), 100_000);
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-5").is_err());
    assert!(parse_amount("ten").is_err());
  }

  #[test]
  fn test_price_allows_zero() {
    assert_eq!(parse_price("0").unwrap(), 0);
    assert_eq!(parse_price("50,000").unwrap(), 50_000);
    assert!(parse_price("-1").is_err());
  }

  #[test]
  fn test_topup_with_description() {
    let (amount, description) =
      parse_topup("100000 - card to card 6274xxxx").unwrap();
    assert_eq!(amount, 100_000);
    assert_eq!(description, "card to card 6274xxxx");
  }

  #[test]
  fn test_topup_without_description() {
    let (amount, description) = parse_topup("20000").unwrap();
    assert_eq!(amount, 20_000);
    assert!(description.is_empty());
  }

  #[test]
  fn test_topup_bad_amount() {
    assert!(parse_topup("lots - please").is_err());
  }

  #[test]
  fn test_admin_pairs() {
    assert_eq!(parse_id_amount("123456789 10000").unwrap(), (123456789, 10000));
    assert!(parse_id_amount("123456789").is_err());
    assert_eq!(parse_code_value("vip50 5000").unwrap(), ("vip50".into(), 5000));
    assert!(parse_code_value("vip50 lots").is_err());
  }

  #[test]
  fn test_credit_overflow() {
    assert_eq!(add_credit(1000, 500).unwrap(), 1500);
    assert_eq!(sub_credit(100, 1500).unwrap(), -1400);
    assert!(matches!(add_credit(1, i64::MAX), Err(Error::InvalidArgs(_))));
    assert!(matches!(
      sub_credit(-2, i64::MAX),
      Err(Error::InvalidArgs(_))
    ));
  }

  #[test]
  fn test_format_credit() {
    assert_eq!(format_credit(0), "0 T");
    assert_eq!(format_credit(50000), "50000 T");
    assert_eq!(format_credit(-500), "-500 T");
  }
}
