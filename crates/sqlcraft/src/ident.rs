//! Identifier quoting helpers for table references and join conditions.
//!
//! Table inputs may carry an embedded alias (`"orders o"`, `"orders AS o"`);
//! only the base identifier is quoted, the alias is left bare. Join
//! conditions are free text, but bare identifier-like tokens inside them are
//! quoted individually so `a.col = b.col` becomes `` `a`.`col` = `b`.`col` ``
//! while connective keywords and literals pass through untouched.

use crate::dialect::Dialect;

/// Keywords that must never be quoted inside a join condition.
const JOIN_KEYWORDS: &[&str] = &["AND", "OR", "ON", "AS"];

/// Render a table reference, quoting the base identifier and preserving an
/// optional alias (with or without the `AS` keyword, original casing kept).
///
/// Inputs that already contain quote characters or parentheses are passed
/// through unchanged.
pub(crate) fn parse_table(dialect: &dyn Dialect, input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains('`') || trimmed.contains('"') || trimmed.contains('(') {
        return trimmed.to_string();
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.as_slice() {
        [table] => dialect.quote_path(table),
        [table, alias] => format!("{} {}", dialect.quote_path(table), alias),
        [table, kw, alias] if kw.eq_ignore_ascii_case("as") => {
            format!("{} {} {}", dialect.quote_path(table), kw, alias)
        }
        _ => trimmed.to_string(),
    }
}

/// Quote bare identifier tokens inside a join condition.
///
/// Already-quoted regions, string literals, numbers, SQL keywords, and
/// function calls are left untouched. Dotted paths are quoted per segment.
pub(crate) fn quote_join_condition(dialect: &dyn Dialect, condition: &str) -> String {
    let chars: Vec<char> = condition.chars().collect();
    let mut out = String::with_capacity(condition.len() + 8);
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' | '"' => {
                // Copy a quoted region verbatim, including the delimiters.
                let quote = c;
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == quote {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '\'' => {
                // String literal; '' is an escaped quote.
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\'' {
                        if i + 1 < chars.len() && chars[i + 1] == '\'' {
                            out.push('\'');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                let is_keyword = JOIN_KEYWORDS
                    .iter()
                    .any(|kw| token.eq_ignore_ascii_case(kw));
                let is_function_call = chars.get(i) == Some(&'(');
                if is_keyword || is_function_call {
                    out.push_str(&token);
                    continue;
                }
                out.push_str(&dialect.quote_ident(&token));
                // Continue a dotted path: quote each following segment.
                while chars.get(i) == Some(&'.') {
                    out.push('.');
                    i += 1;
                    match chars.get(i) {
                        Some('*') => {
                            out.push('*');
                            i += 1;
                        }
                        Some('`') | Some('"') => break,
                        Some(c2) if c2.is_ascii_alphabetic() || *c2 == '_' => {
                            let seg_start = i;
                            while i < chars.len()
                                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_')
                            {
                                i += 1;
                            }
                            let seg: String = chars[seg_start..i].iter().collect();
                            out.push_str(&dialect.quote_ident(&seg));
                        }
                        _ => break,
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MYSQL;

    #[test]
    fn table_plain() {
        assert_eq!(parse_table(&MYSQL, "users"), "`users`");
    }

    #[test]
    fn table_reserved_word() {
        assert_eq!(parse_table(&MYSQL, "order"), "`order`");
    }

    #[test]
    fn table_with_alias() {
        assert_eq!(parse_table(&MYSQL, "orders o"), "`orders` o");
    }

    #[test]
    fn table_with_as_alias_preserves_casing() {
        assert_eq!(parse_table(&MYSQL, "order as o"), "`order` as o");
        assert_eq!(parse_table(&MYSQL, "order AS o"), "`order` AS o");
    }

    #[test]
    fn table_dotted_schema() {
        assert_eq!(parse_table(&MYSQL, "app.users"), "`app`.`users`");
    }

    #[test]
    fn table_already_quoted_passes_through() {
        assert_eq!(parse_table(&MYSQL, "`order` o"), "`order` o");
    }

    #[test]
    fn join_condition_bare_paths() {
        assert_eq!(
            quote_join_condition(&MYSQL, "u.id = o.user_id"),
            "`u`.`id` = `o`.`user_id`"
        );
    }

    #[test]
    fn join_condition_keywords_untouched() {
        assert_eq!(
            quote_join_condition(&MYSQL, "u.id = o.user_id AND o.active = 1"),
            "`u`.`id` = `o`.`user_id` AND `o`.`active` = 1"
        );
    }

    #[test]
    fn join_condition_already_quoted() {
        let cond = "`o`.`user_id` = `u`.`id`";
        assert_eq!(quote_join_condition(&MYSQL, cond), cond);
    }

    #[test]
    fn join_condition_string_literal() {
        assert_eq!(
            quote_join_condition(&MYSQL, "u.status = 'it''s on'"),
            "`u`.`status` = 'it''s on'"
        );
    }

    #[test]
    fn join_condition_function_call() {
        assert_eq!(
            quote_join_condition(&MYSQL, "LOWER(u.email) = o.email"),
            "LOWER(`u`.`email`) = `o`.`email`"
        );
    }
}
