use anyhow::Result;
use std::io::{self, IsTerminal};
use zeroize::Zeroizing;

/// Environment variable consulted before stdin or the terminal.
pub const PASSPHRASE_ENV: &str = "MSGSEAL_PASSPHRASE";

/// Looks for a passphrase without inventing one.
///
/// Returns `None` when no source yields a non-empty passphrase.
pub fn read_passphrase() -> Result<Option<Zeroizing<String>>> {
    //  Environment Variable
    //  MSGSEAL_PASSPHRASE="correct-horse" msgseal open "<envelope>"
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Some(Zeroizing::new(pw)));
        }
    }

    //  stdin (Pipeline)
    //  printf "%s" "$SHARED_KEY" | msgseal open "<envelope>"
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(Some(buf));
        }
        return Ok(None);
    }

    //  Interactive (TTY)
    let pw = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
    if !pw.is_empty() {
        return Ok(Some(pw));
    }

    Ok(None)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_newline_strips_crlf_only() {
        let mut s = String::from("  pass phrase \r\n");
        trim_newline(&mut s);
        assert_eq!(s, "  pass phrase ");
    }
}
