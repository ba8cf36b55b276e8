#![allow(dead_code)]

use examiner_common::config::EngineConfig;
use examiner_common::types::Language;
use examiner_engine::Engine;
use tempfile::TempDir;

/// Engine rooted in a private temp dir, or `None` when `language` has no
/// usable toolchain on this host
pub async fn engine_for(language: Language) -> Option<(TempDir, Engine)> {
    let root = TempDir::new().expect("Failed to create workspace root");
    let config = EngineConfig {
        workspace_root: root.path().to_path_buf(),
        ..EngineConfig::default()
    };
    let engine = Engine::new(config).expect("Failed to create engine");

    let status = engine.check(language).await;
    if !status.available {
        eprintln!(
            "skipping {}: {}",
            language,
            status.reason.unwrap_or_default()
        );
        return None;
    }
    Some((root, engine))
}

pub fn workspace_root_is_empty(root: &TempDir) -> bool {
    std::fs::read_dir(root.path())
        .expect("Failed to list workspace root")
        .next()
        .is_none()
}

pub fn hello_world(language: Language) -> &'static str {
    match language {
        Language::Java => {
            "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}\n"
        }
        Language::C => "#include <stdio.h>\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}\n",
        // Relies on header and namespace injection
        Language::Cpp => "int main() {\n    cout << \"Hello, World!\" << endl;\n    return 0;\n}\n",
        Language::Python => "print(\"Hello, World!\")\n",
    }
}

pub fn add_two_numbers(language: Language) -> &'static str {
    match language {
        // A bare snippet: wrapped in a class, java.util imported
        Language::Java => {
            "Scanner sc = new Scanner(System.in);\nint a = sc.nextInt();\nint b = sc.nextInt();\nSystem.out.println(a + b);\n"
        }
        Language::C => "int main() {\n    int a, b;\n    if (scanf(\"%d %d\", &a, &b) != 2) return 1;\n    printf(\"%d\\n\", a + b);\n    return 0;\n}\n",
        Language::Cpp => "#include <iostream>\nint main() {\n    long long a, b;\n    std::cin >> a >> b;\n    std::cout << a + b << std::endl;\n}\n",
        Language::Python => "a, b = map(int, input().split())\nprint(a + b)\n",
    }
}

pub fn always_zero(language: Language) -> &'static str {
    match language {
        Language::Java => "System.out.println(0);",
        Language::C | Language::Cpp => "#include <stdio.h>\nint main() { puts(\"0\"); return 0; }\n",
        Language::Python => "print(0)\n",
    }
}

pub fn infinite_loop(language: Language) -> &'static str {
    match language {
        Language::Java => {
            "public class Main {\n    public static void main(String[] args) {\n        long n = 0;\n        while (true) { n++; }\n    }\n}\n"
        }
        Language::C | Language::Cpp => "int main() {\n    volatile unsigned long n = 0;\n    while (1) { n++; }\n}\n",
        Language::Python => "n = 0\nwhile True:\n    n += 1\n",
    }
}

/// `None` for languages without a compile step
pub fn syntax_error(language: Language) -> Option<&'static str> {
    match language {
        Language::Java => Some("public class Main {\n    public static void main(String[] args) {\n        int x = ;\n    }\n}\n"),
        Language::C | Language::Cpp => Some("int main( {\n    return 0;\n}\n"),
        Language::Python => None,
    }
}

pub fn recursive_fibonacci(language: Language) -> &'static str {
    match language {
        // Non-public class, C-style main parameter, no imports
        Language::Java => {
            "class Solution {\n    static long fib(int n) {\n        return n < 2 ? n : fib(n - 1) + fib(n - 2);\n    }\n\n    static void main(String args[]) {\n        Scanner in = new Scanner(System.in);\n        System.out.println(fib(in.nextInt()));\n    }\n}\n"
        }
        Language::C => "long fib(int n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }\n\nint main() {\n    int n;\n    if (scanf(\"%d\", &n) != 1) return 1;\n    printf(\"%ld\\n\", fib(n));\n    return 0;\n}\n",
        Language::Cpp => "long long fib(int n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }\n\nint main() {\n    int n;\n    cin >> n;\n    cout << fib(n) << endl;\n}\n",
        Language::Python => "import sys\n\ndef fib(n):\n    return n if n < 2 else fib(n - 1) + fib(n - 2)\n\nprint(fib(int(sys.stdin.read())))\n",
    }
}
