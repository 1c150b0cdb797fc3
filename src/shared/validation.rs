//! Request field validation
//!
//! The same shape rules the frontend enforces: email must look like
//! `local@domain.tld` with no whitespace, passwords need at least 8
//! characters, names allow Latin letters (accented included) and spaces.

/// Valid when the address matches `^[^\s@]+@[^\s@]+\.[^\s@]+$`
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return false;
    }
    // no second '@' allowed
    if domain.contains('@') {
        return false;
    }
    // domain needs a dot with something on both sides
    match domain.rsplit_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}

/// At least 8 characters
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
}

/// Non-empty, Latin letters (including the accented `À`..`ÿ` range) and
/// whitespace only
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || ('À'..='ÿ').contains(&c) || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(!is_valid_email("test"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("test@test"));
        assert!(!is_valid_email("@test.com"));
        assert!(!is_valid_email("te st@test.com"));
        assert!(!is_valid_email("test@te@st.com"));
        assert!(!is_valid_email("test@.com"));
        assert!(is_valid_email("test@test.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn password_validation() {
        assert!(!is_valid_password("12345"));
        assert!(!is_valid_password(""));
        assert!(is_valid_password("12345678"));
    }

    #[test]
    fn name_validation() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("test1"));
        assert!(!is_valid_name("test!"));
        assert!(is_valid_name("test test"));
        assert!(is_valid_name("María José"));
    }
}
