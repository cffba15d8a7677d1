//! Vendor and customer identity blocks.

use regex::Regex;

use super::patterns::*;
use crate::models::invoice::{is_found, CustomerInformation, VendorInformation, NOT_FOUND};

/// Extracts company identity and address blocks from region text.
#[derive(Debug, Clone, Default)]
pub struct VendorCustomerExtractor;

impl VendorCustomerExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Vendor identity from the vendor region, falling back to the header for
    /// name and contact details.
    pub fn extract_vendor(&self, vendor: &str, header: &str) -> VendorInformation {
        let search = |patterns: &[&Regex]| {
            [vendor, header]
                .iter()
                .find_map(|text| first_capture(patterns, *text))
                .unwrap_or_else(|| NOT_FOUND.to_string())
        };

        let mut info = VendorInformation {
            name: search(&[&*COMPANY_NAME]),
            phone: search(&[&*PHONE_LABELED, &*PHONE_INTERNATIONAL, &*PHONE_LOCAL]),
            website: search(&[&*WEBSITE_WWW, &*WEBSITE_DOMAIN]),
            email: [vendor, header]
                .iter()
                .find_map(|text| EMAIL.find(*text))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            ..VendorInformation::default()
        };

        let known: Vec<&str> = [&info.name, &info.phone, &info.website, &info.email]
            .into_iter()
            .filter(|v| is_found(v))
            .map(String::as_str)
            .collect();

        let address = join_lines(vendor.lines().filter(|line| {
            !known.iter().any(|k| line.contains(k)) && !VENDOR_NOISE.is_match(line)
        }));
        if let Some(address) = address {
            info.address = address;
        }
        info
    }

    /// Customer identity from the customer region.
    pub fn extract_customer(&self, customer: &str) -> CustomerInformation {
        let mut info = CustomerInformation::default();

        if let Some(name) = CUSTOMER_LABEL
            .captures_iter(customer)
            .find_map(|caps| {
                let same_line = caps.get(1).map_or("", |m| m.as_str());
                let next_line = caps.get(2).map_or("", |m| m.as_str());
                customer_name(same_line).or_else(|| customer_name(next_line))
            })
        {
            info.name = name;
        }

        let address = join_lines(customer.lines().filter(|line| {
            !CUSTOMER_NOISE.is_match(line)
                && !PARTY_LABEL.is_match(line)
                && !(is_found(&info.name) && line.contains(info.name.as_str()))
        }));
        if let Some(address) = address {
            info.address = address;
        }
        info
    }
}

/// First non-empty capture group of the first matching pattern.
fn first_capture(patterns: &[&Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern.captures_iter(text).find_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim())
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
    })
}

/// The label remainder up to the first tax id, address label or digit.
fn customer_name(rest: &str) -> Option<String> {
    let end = NAME_BOUNDARY.find(rest).map_or(rest.len(), |m| m.start());
    let name = rest[..end]
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == ':' || c == '-')
        .trim();
    (!name.is_empty() && name.chars().any(char::is_alphabetic)).then(|| name.to_string())
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let lines: Vec<&str> = lines.map(str::trim).filter(|l| !l.is_empty()).collect();
    (!lines.is_empty()).then(|| lines.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_identity() {
        let header = "INVOICE\nInvoice Number: 161126\nDate: Nov 26, 2016\nYesLogic Pty. Ltd.\n7 / 39 Bouverie St";
        let vendor = "Carlton VIC 3053\nPhone: +61 3 9347 0000\nwww.yeslogic.com\nsales@yeslogic.com";
        let info = VendorCustomerExtractor::new().extract_vendor(vendor, header);

        assert_eq!(info.name, "YesLogic Pty. Ltd.");
        assert_eq!(info.phone, "+61 3 9347 0000");
        assert_eq!(info.website, "www.yeslogic.com");
        assert_eq!(info.email, "sales@yeslogic.com");
        assert_eq!(info.address, "Carlton VIC 3053");
    }

    #[test]
    fn test_vendor_noise_rows_excluded_from_address() {
        let vendor = "Acme Corp.\n12 Main St\nInvoice date: 01/01/2020\nSpringfield";
        let info = VendorCustomerExtractor::new().extract_vendor(vendor, "");
        assert_eq!(info.name, "Acme Corp.");
        assert_eq!(info.address, "12 Main St, Springfield");
        assert_eq!(info.website, NOT_FOUND);
    }

    #[test]
    fn test_bare_domain_website_is_not_email() {
        let vendor = "billing@example.net\nvisit example.org";
        let info = VendorCustomerExtractor::new().extract_vendor(vendor, "");
        assert_eq!(info.website, "example.org");
        assert_eq!(info.email, "billing@example.net");
    }

    #[test]
    fn test_customer_name_stops_at_boundary() {
        let customer = "Bill To: Acme Widgets Tax Id: 123-45-6789\n12 Main Street\nSpringfield";
        let info = VendorCustomerExtractor::new().extract_customer(customer);
        assert_eq!(info.name, "Acme Widgets");
        assert_eq!(info.address, "12 Main Street, Springfield");
    }

    #[test]
    fn test_customer_name_on_next_line() {
        let customer = "Seller: Client:\nJackson Ltd\n28 Hill Road\nIBAN: GB81LJXE12345";
        let info = VendorCustomerExtractor::new().extract_customer(customer);
        assert_eq!(info.name, "Jackson Ltd");
        assert_eq!(info.address, "28 Hill Road");
    }

    #[test]
    fn test_empty_regions() {
        let extractor = VendorCustomerExtractor::new();
        assert_eq!(extractor.extract_vendor("", ""), VendorInformation::default());
        assert_eq!(extractor.extract_customer(""), CustomerInformation::default());
    }
}
