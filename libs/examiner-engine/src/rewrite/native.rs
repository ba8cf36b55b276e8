/// C/C++ header injection.
///
/// Adds a short list of standard headers when the code obviously uses them
/// without including them. For C++ also adds `using namespace std;` when
/// standard names appear unqualified. `<bits/stdc++.h>` counts as including
/// everything. Preprocessor lines never trigger anything, so
/// `#include <string.h>` does not look like a use of `string`.
use super::{inject_missing_in, InjectionRule};
use regex::Regex;
use std::sync::LazyLock;

static CPP_HEADER_RULES: LazyLock<Vec<InjectionRule>> = LazyLock::new(|| {
    vec![
        InjectionRule::new(
            "#include <iostream>",
            r"#include\s*<(?:iostream|bits/stdc\+\+\.h)>",
            r"\b(?:cin|cout|cerr|endl)\b",
        ),
        InjectionRule::new(
            "#include <string>",
            r"#include\s*<(?:string|bits/stdc\+\+\.h)>",
            r"\b(?:string|getline|to_string|stoi|stoll)\b",
        ),
        InjectionRule::new(
            "#include <vector>",
            r"#include\s*<(?:vector|bits/stdc\+\+\.h)>",
            r"\bvector\s*<",
        ),
        InjectionRule::new(
            "#include <stdio.h>",
            r"#include\s*<(?:stdio\.h|cstdio|bits/stdc\+\+\.h)>",
            r"\b(?:printf|scanf|puts|getchar|putchar|fgets)\s*\(",
        ),
    ]
});

static C_HEADER_RULES: LazyLock<Vec<InjectionRule>> = LazyLock::new(|| {
    vec![
        InjectionRule::new(
            "#include <stdio.h>",
            r"#include\s*<stdio\.h>",
            r"\b(?:printf|scanf|puts|getchar|putchar|fgets)\s*\(",
        ),
        InjectionRule::new(
            "#include <stdlib.h>",
            r"#include\s*<stdlib\.h>",
            r"\b(?:malloc|calloc|realloc|free|atoi|qsort)\s*\(",
        ),
        InjectionRule::new(
            "#include <string.h>",
            r"#include\s*<string\.h>",
            r"\b(?:strlen|strcpy|strncpy|strcmp|strcat|memset|memcpy)\s*\(",
        ),
    ]
});

static USING_STD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\busing\s+namespace\s+std\s*;").expect("invalid using-directive regex")
});

static STD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(std\s*::\s*)?\b(?:cin|cout|cerr|endl|string|vector|getline|to_string)\b")
        .expect("invalid std name regex")
});

static INCLUDE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#include[^\n]*\n?").expect("invalid include regex"));

pub fn normalize_cpp(source: &str) -> String {
    let code = without_directives(source);
    let source = inject_missing_in(source, &code, &CPP_HEADER_RULES);

    if USING_STD.is_match(&source) || !uses_unqualified_std(&code) {
        return source;
    }

    // The directive needs namespace std declared, so it goes after the includes
    let insert_at = INCLUDE_LINE
        .find_iter(&source)
        .last()
        .map(|m| m.end())
        .unwrap_or(0);

    let mut out = String::with_capacity(source.len() + 21);
    out.push_str(&source[..insert_at]);
    if insert_at > 0 && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("using namespace std;\n");
    out.push_str(&source[insert_at..]);
    out
}

pub fn normalize_c(source: &str) -> String {
    let code = without_directives(source);
    inject_missing_in(source, &code, &C_HEADER_RULES)
}

/// Source minus preprocessor lines
fn without_directives(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn uses_unqualified_std(code: &str) -> bool {
    STD_NAME
        .captures_iter(code)
        .any(|caps| caps.get(1).is_none())
}
