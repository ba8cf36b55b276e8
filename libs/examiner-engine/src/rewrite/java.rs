/// Java source normalization
///
/// `javac` insists that a public top-level type lives in a file of the same
/// name, and `java` needs to be told which class holds `main`. Submissions
/// arrive as anything from a full program to a handful of statements, so
/// before compiling we settle on one class name and make the source agree:
///
/// 1. A top-level `public` type exists: its name is the class name
/// 2. Otherwise a top-level class is promoted to `public` (the one declared
///    closest before `main`, else the first one)
/// 3. Otherwise the snippet is wrapped in `public class Main`
///
/// Also strips `package` declarations (the workspace is flat), fixes the
/// usual `main` signature mistakes and adds `java.util`/`java.io` imports
/// when the code uses them without importing.
use super::{code_depth_at, inject_missing, is_top_level_code, InjectionRule};
use regex::Regex;
use std::sync::LazyLock;

/// Class name used when the submission declares no type at all
pub const DEFAULT_CLASS_NAME: &str = "Main";

static PACKAGE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*package\s+[\w.]+\s*;[ \t]*\r?\n?").expect("invalid package regex")
});

static PUBLIC_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:final|abstract|strictfp|sealed|non-sealed)\s+)*(?:class|interface|enum|record)\s+([A-Za-z_$][\w$]*)",
    )
    .expect("invalid public type regex")
});

static ANY_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:class|interface|enum|record)\s+[A-Za-z_$][\w$]*\s*[{<(]|\b(?:class|interface|enum)\s+[A-Za-z_$][\w$]*\s+(?:extends|implements)\b")
        .expect("invalid type declaration regex")
});

static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(?:final|abstract|strictfp)\s+)*class\s+([A-Za-z_$][\w$]*)")
        .expect("invalid class regex")
});

static MAIN_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:public|private|protected|static|final|synchronized)\s+)*void\s+(?i:main)\s*\(\s*(?:final\s+)?String\s*(?:\[\s*\]\s*(?P<bracket>[A-Za-z_$][\w$]*)|\.\.\.\s*(?P<varargs>[A-Za-z_$][\w$]*)|(?P<cstyle>[A-Za-z_$][\w$]*)\s*\[\s*\])\s*\)",
    )
    .expect("invalid main signature regex")
});

static MAIN_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvoid\s+main\s*\(").expect("invalid main regex"));

static METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:(?:public|private|protected|static|final)\s+)+[\w<>\[\], ]+\s+\w+\s*\([^)]*\)\s*(?:throws\s+[\w., ]+)?\{")
        .expect("invalid method regex")
});

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*import\s+(?:static\s+)?[\w.]+(?:\.\*)?\s*;\s*$").expect("invalid import regex")
});

static IMPORT_RULES: LazyLock<Vec<InjectionRule>> = LazyLock::new(|| {
    vec![
        InjectionRule::new(
            "import java.util.*;",
            r"\bimport\s+java\.util\.\*\s*;",
            r"\b(?:Scanner|ArrayList|List|LinkedList|HashMap|Map|TreeMap|HashSet|Set|TreeSet|Arrays|Collections|Deque|ArrayDeque|Queue|PriorityQueue|Stack|Iterator|Random|StringTokenizer|Optional)\b",
        ),
        InjectionRule::new(
            "import java.io.*;",
            r"\bimport\s+java\.io\.\*\s*;",
            r"\b(?:BufferedReader|InputStreamReader|IOException|PrintWriter|BufferedWriter|OutputStreamWriter|StreamTokenizer)\b",
        ),
    ]
});

/// Source ready to be written as `<class_name>.java`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaSource {
    pub class_name: String,
    pub source: String,
}

impl JavaSource {
    pub fn file_name(&self) -> String {
        format!("{}.java", self.class_name)
    }
}

pub fn normalize(source: &str) -> JavaSource {
    let source = PACKAGE_DECL.replace_all(source, "").into_owned();

    let (class_name, source) = if let Some(name) = top_level_public_type(&source) {
        (name, source)
    } else if let Some((name, start)) = promotable_class(&source) {
        let mut promoted = String::with_capacity(source.len() + 7);
        promoted.push_str(&source[..start]);
        promoted.push_str("public ");
        promoted.push_str(&source[start..]);
        (name, promoted)
    } else if has_type_declaration(&source) {
        // Only interfaces/enums/records at top level; nothing runnable to name
        (DEFAULT_CLASS_NAME.to_string(), source)
    } else {
        (DEFAULT_CLASS_NAME.to_string(), wrap_snippet(&source))
    };

    let source = normalize_main_signature(&source);
    let source = inject_missing(&source, &IMPORT_RULES);

    JavaSource { class_name, source }
}

fn top_level_public_type(source: &str) -> Option<String> {
    PUBLIC_TYPE
        .captures_iter(source)
        .filter_map(|caps| {
            let decl = caps.get(0)?;
            let name = caps.get(1)?;
            is_top_level_code(source, decl.start()).then(|| name.as_str().to_string())
        })
        .next()
}

fn has_type_declaration(source: &str) -> bool {
    ANY_TYPE
        .find_iter(source)
        .any(|m| is_top_level_code(source, m.start()))
}

/// Top-level class to make public, with the byte offset of its declaration
fn promotable_class(source: &str) -> Option<(String, usize)> {
    let classes: Vec<(String, usize)> = CLASS_DECL
        .captures_iter(source)
        .filter_map(|caps| {
            let decl = caps.get(0)?;
            let name = caps.get(1)?;
            is_top_level_code(source, decl.start())
                .then(|| (name.as_str().to_string(), decl.start()))
        })
        .collect();

    let main_at = MAIN_METHOD
        .find_iter(source)
        .map(|m| m.start())
        .find(|&at| code_depth_at(source, at).is_some());
    let before_main = main_at.and_then(|at| classes.iter().rev().find(|(_, start)| *start < at));

    before_main.or_else(|| classes.first()).cloned()
}

/// Put a bare snippet inside a runnable class, keeping imports outside
fn wrap_snippet(source: &str) -> String {
    let (imports, body): (Vec<&str>, Vec<&str>) =
        source.lines().partition(|line| IMPORT_LINE.is_match(line));
    let body = body.join("\n");

    let mut out = String::new();
    for import in imports {
        out.push_str(import.trim());
        out.push('\n');
    }

    if MAIN_METHOD.is_match(&body) || METHOD_DECL.is_match(&body) {
        // Members without a class
        out.push_str(&format!("public class {} {{\n{}\n}}\n", DEFAULT_CLASS_NAME, body));
    } else {
        out.push_str(&format!(
            "public class {} {{\n    public static void main(String[] args) throws Exception {{\n{}\n    }}\n}}\n",
            DEFAULT_CLASS_NAME, body
        ));
    }
    out
}

/// Rewrite `void Main(String args[])` and friends to the canonical entry point
fn normalize_main_signature(source: &str) -> String {
    MAIN_SIGNATURE
        .replace_all(source, |caps: &regex::Captures| {
            let param = caps
                .name("bracket")
                .or_else(|| caps.name("varargs"))
                .or_else(|| caps.name("cstyle"))
                .map(|m| m.as_str())
                .unwrap_or("args");
            format!("public static void main(String[] {})", param)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_class_name_is_kept() {
        let source = "public class Solution {\n    public static void main(String[] args) {\n        System.out.println(1);\n    }\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, "Solution");
        assert_eq!(normalized.file_name(), "Solution.java");
        assert_eq!(normalized.source, source);
    }

    #[test]
    fn test_nested_public_class_is_not_the_file_name() {
        let source = "class Outer {\n    public static class Node { int v; }\n    public static void main(String[] args) {}\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, "Outer");
        assert!(normalized.source.starts_with("public class Outer"));
    }

    #[test]
    fn test_class_declared_before_main_is_promoted() {
        let source = "class Helper {\n    static int twice(int x) { return 2 * x; }\n}\nclass Program {\n    public static void main(String[] args) {\n        System.out.println(Helper.twice(21));\n    }\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, "Program");
        assert!(normalized.source.contains("class Helper"));
        assert!(!normalized.source.contains("public class Helper"));
        assert!(normalized.source.contains("public class Program"));
    }

    #[test]
    fn test_bare_statements_are_wrapped() {
        let source = "int a = 2;\nint b = 3;\nSystem.out.println(a + b);";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, DEFAULT_CLASS_NAME);
        assert!(normalized.source.starts_with("public class Main {"));
        assert!(normalized
            .source
            .contains("public static void main(String[] args) throws Exception {"));
        assert!(normalized.source.contains("System.out.println(a + b);"));
    }

    #[test]
    fn test_wrapping_hoists_imports() {
        let source = "import java.util.Scanner;\nScanner in = new Scanner(System.in);\nSystem.out.println(in.nextInt() * 2);";
        let normalized = normalize(source);

        let class_at = normalized.source.find("public class Main").unwrap();
        let import_at = normalized.source.find("import java.util.Scanner;").unwrap();
        assert!(import_at < class_at);
    }

    #[test]
    fn test_bare_methods_are_wrapped_as_members() {
        let source = "public static void main(String[] args) {\n    System.out.println(\"hi\");\n}";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, DEFAULT_CLASS_NAME);
        assert_eq!(normalized.source.matches("void main").count(), 1);
    }

    #[test]
    fn test_main_signature_mistakes_are_fixed() {
        assert_eq!(
            normalize_main_signature("static void Main(String args[]) {"),
            "public static void main(String[] args) {"
        );
        assert_eq!(
            normalize_main_signature("void main(String... argv) {"),
            "public static void main(String[] argv) {"
        );
        assert_eq!(
            normalize_main_signature("public void MAIN(String[] a) {"),
            "public static void main(String[] a) {"
        );
    }

    #[test]
    fn test_other_methods_are_untouched() {
        let source = "static void mainLoop(String[] a) {}\nstatic int main(int x) { return x; }";
        assert_eq!(normalize_main_signature(source), source);
    }

    #[test]
    fn test_type_named_in_comment_is_ignored() {
        let source = "// public class Foo is described here\npublic class Main {\n    public static void main(String[] args) {\n        System.out.println(1);\n    }\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, "Main");
        assert_eq!(normalized.file_name(), "Main.java");
        assert_eq!(normalized.source, source);
    }

    #[test]
    fn test_class_word_in_string_literal_is_left_alone() {
        let source = "System.out.println(\"my class Foo {\");";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, DEFAULT_CLASS_NAME);
        assert!(normalized.source.contains("System.out.println(\"my class Foo {\");"));
        assert!(!normalized.source.contains("public class Foo"));
        assert!(normalized.source.starts_with("public class Main {"));
    }

    #[test]
    fn test_commented_out_class_is_not_promoted() {
        let source = "/* class Old { } */\nclass Solution {\n    static void main(String[] args) {}\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.class_name, "Solution");
        assert!(normalized.source.contains("/* class Old { } */"));
        assert!(normalized.source.contains("public class Solution"));
    }

    #[test]
    fn test_package_is_stripped() {
        let source = "package com.example.exam;\n\npublic class Main {}\n";
        let normalized = normalize(source);

        assert!(!normalized.source.contains("package"));
        assert_eq!(normalized.class_name, "Main");
    }

    #[test]
    fn test_util_import_injected_when_used() {
        let source = "public class Main {\n    public static void main(String[] args) {\n        Scanner sc = new Scanner(System.in);\n    }\n}\n";
        let normalized = normalize(source);

        assert!(normalized.source.starts_with("import java.util.*;\n"));
        assert!(!normalized.source.contains("import java.io.*;"));
    }

    #[test]
    fn test_imports_not_duplicated() {
        let source = "import java.util.*;\nimport java.io.*;\npublic class Main {\n    public static void main(String[] args) throws IOException {\n        List<Integer> xs = new ArrayList<>();\n    }\n}\n";
        let normalized = normalize(source);

        assert_eq!(normalized.source, source);
    }
}
