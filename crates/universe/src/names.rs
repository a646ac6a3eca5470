//! Company name cleaning for symbol search.

const CORPORATE_SUFFIXES: &[&str] = &["AG", "SE", "SA", "NV", "PLC", "SPA", "OYJ", "KGAA", "ASA", "AB"];

fn is_corporate_suffix(token: &str) -> bool {
    let folded: String =
        token.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '/').collect();
    !folded.is_empty()
        && folded
            .split('/')
            .all(|part| CORPORATE_SUFFIXES.iter().any(|s| s.eq_ignore_ascii_case(part)))
}

/// Remove trailing legal-form tokens such as `AG`, `S.A.` or `N.V.` from a company name.
///
/// Tokens are dropped from the end while they are legal forms, together with
/// commas left behind. A name made only of legal forms is returned unchanged.
#[must_use]
pub fn strip_corporate_suffix(name: &str) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let keep = tokens.iter().rposition(|t| !is_corporate_suffix(t)).map_or(0, |i| i + 1);
    if keep == 0 {
        return tokens.join(" ");
    }
    tokens[..keep].join(" ").trim_end_matches(',').to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Siemens AG", "Siemens")]
    #[case("Banco Santander, S.A.", "Banco Santander")]
    #[case("Koninklijke Ahold Delhaize N.V.", "Koninklijke Ahold Delhaize")]
    #[case("Anheuser-Busch InBev SA/NV", "Anheuser-Busch InBev")]
    #[case("Intesa Sanpaolo SpA", "Intesa Sanpaolo")]
    #[case("Nokia Oyj", "Nokia")]
    #[case("Henkel AG & Co. KGaA", "Henkel AG & Co.")]
    #[case("  TotalEnergies   SE ", "TotalEnergies")]
    #[case("Safran", "Safran")]
    #[case("SAP", "SAP")]
    #[case("SE", "SE")]
    fn strips_legal_forms(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(strip_corporate_suffix(name), expected);
    }
}
