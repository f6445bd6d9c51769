//! Conversion between `camelCase` field names and `snake_case` column names.

/// Converts a `camelCase` identifier to `snake_case`.
///
/// Every upper-case character is replaced by `_` followed by its lower-case
/// form, except at the very start of the input where no leading `_` is
/// emitted (`"UserId"` becomes `"user_id"`, not `"_user_id"`). Consecutive
/// capitals are split individually (`"userID"` becomes `"user_i_d"`).
#[must_use]
pub fn to_snake(camel: &str) -> String {
    let mut snake = String::with_capacity(camel.len() + 4);
    for (i, ch) in camel.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}

/// Converts a `snake_case` identifier to `camelCase`.
///
/// Each `_` is dropped and the character that follows it is upper-cased;
/// every other character is lower-cased.
#[must_use]
pub fn to_camel(snake: &str) -> String {
    let mut camel = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            camel.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            camel.extend(ch.to_lowercase());
        }
    }
    camel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_from_camel() {
        assert_eq!(to_snake("userId"), "user_id");
        assert_eq!(to_snake("createdAtUtc"), "created_at_utc");
        assert_eq!(to_snake("name"), "name");
        assert_eq!(to_snake(""), "");
    }

    #[test]
    fn leading_capital_has_no_underscore() {
        assert_eq!(to_snake("UserId"), "user_id");
        assert_eq!(to_snake("ID"), "i_d");
    }

    #[test]
    fn camel_from_snake() {
        assert_eq!(to_camel("user_id"), "userId");
        assert_eq!(to_camel("created_at_utc"), "createdAtUtc");
        assert_eq!(to_camel("Name"), "name");
        assert_eq!(to_camel(""), "");
    }

    #[test]
    fn camel_snake_round_trip() {
        for name in ["userId", "id", "orderLineItemCount", "userID", "aB", "emailAddress2"] {
            assert_eq!(to_camel(&to_snake(name)), name, "round trip of {name}");
        }
    }
}
