//! AST-level checks that background loops can always be stopped.
//!
//! Two rules, checked over every file in `src/`:
//!
//! 1. `tokio::spawn` is only called from `src/pollers/`. Everything else
//!    runs inside a request or goes through a poller.
//! 2. Every `loop` in async code selects on a cancellation token:
//!    ```ignore
//!    loop {
//!        tokio::select! {
//!            _ = token.cancelled() => break,
//!            _ = ticker.tick() => { /* work */ }
//!        }
//!    }
//!    ```
//!
//! A poll loop without a cancellation branch keeps polling the metering
//! API after its reader session stopped, and blocks shutdown.

use std::fs;
use std::path::Path;
use syn::visit::Visit;
use syn::{ExprAsync, ExprCall, ExprLoop, ImplItemFn, ItemFn, Macro};
use walkdir::WalkDir;

struct LoopVisitor {
    file: String,
    /// Whether the file lives under src/pollers/
    in_pollers: bool,
    async_depth: usize,
    /// Cancellation selects seen in the loop currently being visited
    loop_selects: Vec<bool>,
    violations: Vec<String>,
}

impl LoopVisitor {
    fn new(file: String, in_pollers: bool) -> Self {
        Self {
            file,
            in_pollers,
            async_depth: 0,
            loop_selects: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn check_macro(&mut self, mac: &Macro) {
        let last = mac.path.segments.last().map(|s| s.ident.to_string());
        if last.as_deref() == Some("select") && mac.tokens.to_string().contains("cancelled") {
            if let Some(seen) = self.loop_selects.last_mut() {
                *seen = true;
            }
        }
    }
}

impl<'ast> Visit<'ast> for LoopVisitor {
    fn visit_item_fn(&mut self, item: &'ast ItemFn) {
        let is_async = item.sig.asyncness.is_some();
        self.async_depth += usize::from(is_async);
        syn::visit::visit_item_fn(self, item);
        self.async_depth -= usize::from(is_async);
    }

    fn visit_impl_item_fn(&mut self, item: &'ast ImplItemFn) {
        let is_async = item.sig.asyncness.is_some();
        self.async_depth += usize::from(is_async);
        syn::visit::visit_impl_item_fn(self, item);
        self.async_depth -= usize::from(is_async);
    }

    fn visit_expr_async(&mut self, block: &'ast ExprAsync) {
        self.async_depth += 1;
        syn::visit::visit_expr_async(self, block);
        self.async_depth -= 1;
    }

    fn visit_expr_call(&mut self, call: &'ast ExprCall) {
        if let syn::Expr::Path(path) = &*call.func {
            let segments: Vec<String> = path
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect();
            if segments == ["tokio", "spawn"] && !self.in_pollers {
                self.violations
                    .push(format!("{}: tokio::spawn outside src/pollers/", self.file));
            }
        }
        syn::visit::visit_expr_call(self, call);
    }

    fn visit_expr_loop(&mut self, loop_expr: &'ast ExprLoop) {
        if self.async_depth == 0 {
            syn::visit::visit_expr_loop(self, loop_expr);
            return;
        }
        self.loop_selects.push(false);
        syn::visit::visit_expr_loop(self, loop_expr);
        if self.loop_selects.pop() != Some(true) {
            let label = loop_expr
                .label
                .as_ref()
                .map(|l| format!("'{}", l.name.ident))
                .unwrap_or_else(|| "loop".to_string());
            self.violations.push(format!(
                "{}: async {} without a cancellation select",
                self.file, label
            ));
        }
    }

    fn visit_macro(&mut self, mac: &'ast Macro) {
        self.check_macro(mac);
        syn::visit::visit_macro(self, mac);
    }
}

fn analyze_file(path: &Path, in_pollers: bool) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        return vec![];
    };
    let syntax = match syn::parse_file(&content) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
            return vec![];
        }
    };
    let mut visitor = LoopVisitor::new(path.display().to_string(), in_pollers);
    visitor.visit_file(&syntax);
    visitor.violations
}

#[test]
fn background_loops_are_cancellable() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let pollers_dir = src_dir.join("pollers");

    let violations: Vec<String> = WalkDir::new(&src_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .flat_map(|e| analyze_file(e.path(), e.path().starts_with(&pollers_dir)))
        .collect();

    assert!(
        violations.is_empty(),
        "\n\nBackground work that cannot be cancelled:\n  - {}\n",
        violations.join("\n  - ")
    );
}

#[test]
fn detects_uncancellable_loop() {
    let source = r#"
        async fn run() {
            loop {
                tick().await;
            }
        }
        async fn ok(token: CancellationToken) {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick() => {}
                }
            }
        }
        fn handler() {
            tokio::spawn(async {});
        }
    "#;
    let syntax = syn::parse_file(source).unwrap();
    let mut visitor = LoopVisitor::new("sample.rs".into(), false);
    visitor.visit_file(&syntax);
    assert_eq!(visitor.violations.len(), 2, "{:?}", visitor.violations);
}
