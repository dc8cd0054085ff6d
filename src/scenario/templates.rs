//! Fixed candidate sets the attacker draws from.
//!
//! Everything here is inert text. Payload fragments are shown to the
//! operator as strings and never evaluated anywhere.

/// Password guesses for the brute-force scenario.
pub const PASSWORDS: [&str; 6] = ["12345", "qwerty", "password", "letmein", "admin", "root123"];

/// SQL-injection-shaped fragments.
pub const SQLI_FRAGMENTS: [&str; 3] = ["' OR '1'='1", "'; --", "' OR 'a'='a"];

/// XSS-shaped fragments.
pub const XSS_FRAGMENTS: [&str; 2] = [
    "<script>alert(1)</script>",
    "<img src=x onerror=alert(1)>",
];

/// Phishing email bodies. `{url}` is replaced with the scenario URL.
pub const PHISHING_TEMPLATES: [&str; 3] = [
    "Urgent: Please verify your account at {url} immediately to avoid suspension.",
    "Payroll issue: confirm bank details here {url} so we can process your salary.",
    "Action required: You have a file waiting at {url}. Please review.",
];

/// Ports probed by the port-scan scenario.
pub const SCAN_PORTS: [u16; 5] = [22, 80, 443, 3306, 8080];

/// Placeholder link used in phishing emails. Not a real external target.
pub const DEFAULT_PHISHING_URL: &str = "http://example.local/verify";
