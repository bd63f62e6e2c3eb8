//! Executable script emission
//!
//! Each dialect renders a skeleton with the requirement id, description and
//! case kind embedded as documentation, the framework's setup/teardown
//! idiom, and one test function per case whose body walks the steps.
//! Unknown dialects render an empty body.

use apex_model::{CaseKind, Requirement, TestStep};
use std::fmt;
use std::str::FromStr;

const APP_URL: &str = "https://app.example.test";

/// Supported script dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptDialect {
    /// pytest + selenium
    Python,
    /// Playwright test
    JavaScript,
    /// NUnit + selenium
    CSharp,
}

impl ScriptDialect {
    /// All supported dialects
    pub const ALL: [ScriptDialect; 3] = [Self::Python, Self::JavaScript, Self::CSharp];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::CSharp => "csharp",
        }
    }

    /// Frameworks a suite in this dialect can target
    #[must_use]
    pub const fn frameworks(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["pytest", "unittest", "selenium", "playwright"],
            Self::JavaScript => &["jest", "mocha", "playwright", "cypress"],
            Self::CSharp => &["nunit", "xunit", "selenium", "specflow"],
        }
    }

    /// Double-quoted string literal for `text` in this dialect
    ///
    /// Control characters become `\uXXXX` escapes, which all three languages
    /// accept. JavaScript and C# also escape the line and paragraph separators,
    /// which end a literal in C#.
    #[must_use]
    pub fn string_literal(self, text: &str) -> String {
        let mut literal = String::with_capacity(text.len() + 2);
        literal.push('"');
        for c in text.chars() {
            match c {
                '\\' => literal.push_str("\\\\"),
                '"' => literal.push_str("\\\""),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                '\t' => literal.push_str("\\t"),
                '\u{2028}' | '\u{2029}' if self != Self::Python => {
                    literal.push_str(&format!("\\u{:04x}", u32::from(c)));
                }
                c if c.is_control() => literal.push_str(&format!("\\u{:04x}", u32::from(c))),
                c => literal.push(c),
            }
        }
        literal.push('"');
        literal
    }
}

impl fmt::Display for ScriptDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "javascript" => Ok(Self::JavaScript),
            "csharp" => Ok(Self::CSharp),
            other => Err(format!("unsupported script dialect: '{other}'")),
        }
    }
}

/// Frameworks for a dialect name; empty when unsupported
#[must_use]
pub fn frameworks_for(dialect: &str) -> Vec<&'static str> {
    dialect
        .parse::<ScriptDialect>()
        .map(|d| d.frameworks().to_vec())
        .unwrap_or_default()
}

/// Render a script for `dialect`, or an empty string when unsupported
#[must_use]
pub fn render_script(
    dialect: &str,
    requirement: &Requirement,
    kind: CaseKind,
    steps: &[TestStep],
) -> String {
    match dialect.parse::<ScriptDialect>() {
        Ok(ScriptDialect::Python) => python(requirement, kind, steps),
        Ok(ScriptDialect::JavaScript) => javascript(requirement, kind, steps),
        Ok(ScriptDialect::CSharp) => csharp(requirement, kind, steps),
        Err(reason) => {
            tracing::debug!(requirement_id = %requirement.id, %reason, "no script emitted");
            String::new()
        }
    }
}

/// `DOC-REQ-001` → `DOC_REQ_001`
fn identifier(raw: &str) -> String {
    let ident: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// Collapse whitespace and drop control characters
fn single_line(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

fn python(requirement: &Requirement, kind: CaseKind, steps: &[TestStep]) -> String {
    let class = identifier(&requirement.id);
    let test_name = format!("test_{}_{kind}", class.to_lowercase());
    let description = single_line(&requirement.text)
        .replace('\\', "\\\\")
        .replace("\"\"\"", "'''");

    let mut body = String::new();
    for step in steps {
        body.push_str(&format!(
            "        # Step {}: {} -> {}\n        result = self.perform({})\n",
            step.index,
            single_line(&step.action),
            single_line(&step.expected_outcome),
            ScriptDialect::Python.string_literal(&step.action)
        ));
    }

    let mut script = String::new();
    script.push_str("import pytest\nfrom selenium import webdriver\n\n\n");
    script.push_str(&format!("class Test{class}:\n"));
    script.push_str(&format!(
        "    \"\"\"\n    Requirement: {} - {description}\n    Test Type: {kind}\n    \"\"\"\n\n",
        requirement.id
    ));
    script.push_str("    @pytest.fixture(autouse=True)\n    def setup(self):\n");
    script.push_str("        self.driver = webdriver.Chrome()\n");
    script.push_str(&format!("        self.driver.get(\"{APP_URL}\")\n"));
    script.push_str("        yield\n        self.driver.quit()\n\n");
    script.push_str("    def perform(self, action):\n");
    script.push_str("        return self.driver.execute_script(\"return document.title\")\n\n");
    script.push_str(&format!("    def {test_name}(self):\n"));
    script.push_str(&format!(
        "        \"\"\"Test {} - {kind} scenario\"\"\"\n",
        requirement.id
    ));
    script.push_str("        result = None\n");
    script.push_str(&body);
    script.push_str("        assert result is not None, \"Expected result not found\"\n");
    script
}

fn javascript(requirement: &Requirement, kind: CaseKind, steps: &[TestStep]) -> String {
    let description = single_line(&requirement.text)
        .replace('\\', "\\\\")
        .replace('\'', "\\'");

    let mut body = String::new();
    for step in steps {
        body.push_str(&format!(
            "    // Step {}: {} -> {}\n    await test.step({}, async () => {{}});\n",
            step.index,
            single_line(&step.action),
            single_line(&step.expected_outcome),
            ScriptDialect::JavaScript.string_literal(&step.action)
        ));
    }

    let assertion = match kind {
        CaseKind::Positive | CaseKind::Boundary => {
            "    await expect(page.locator('#result')).toBeVisible();\n"
        }
        CaseKind::Negative => "    await expect(page.locator('.error')).toBeVisible();\n",
    };

    let mut script = String::new();
    script.push_str("const { test, expect } = require('@playwright/test');\n\n");
    script.push_str(&format!(
        "// Requirement: {}\n// Test Type: {kind}\n",
        requirement.id
    ));
    script.push_str(&format!(
        "test.describe('{} - {description}', () => {{\n",
        requirement.id
    ));
    script.push_str(&format!(
        "  test.beforeEach(async ({{ page }}) => {{\n    await page.goto('{APP_URL}');\n  }});\n\n"
    ));
    script.push_str("  test.afterEach(async ({ page }) => {\n    await page.close();\n  });\n\n");
    script.push_str(&format!("  test('{kind} scenario', async ({{ page }}) => {{\n"));
    script.push_str(&body);
    script.push_str(assertion);
    script.push_str("  });\n});\n");
    script
}

fn csharp(requirement: &Requirement, kind: CaseKind, steps: &[TestStep]) -> String {
    let class = identifier(&requirement.id);
    let method = format!("Test_{class}_{kind}");

    let mut body = String::new();
    for step in steps {
        body.push_str(&format!(
            "        // Step {}: {} -> {}\n        Perform({});\n",
            step.index,
            single_line(&step.action),
            single_line(&step.expected_outcome),
            ScriptDialect::CSharp.string_literal(&step.action)
        ));
    }

    let mut script = String::new();
    script.push_str("using NUnit.Framework;\n");
    script.push_str("using OpenQA.Selenium;\nusing OpenQA.Selenium.Chrome;\n\n");
    script.push_str(&format!(
        "// Requirement: {} - {}\n// Test Type: {kind}\n",
        requirement.id,
        single_line(&requirement.text)
    ));
    script.push_str(&format!("[TestFixture]\npublic class {class}Tests\n{{\n"));
    script.push_str("    private IWebDriver driver;\n\n");
    script.push_str("    [SetUp]\n    public void Setup()\n    {\n");
    script.push_str("        driver = new ChromeDriver();\n");
    script.push_str(&format!("        driver.Navigate().GoToUrl(\"{APP_URL}\");\n    }}\n\n"));
    script.push_str("    private void Perform(string action)\n    {\n");
    script.push_str("        TestContext.WriteLine(action);\n    }\n\n");
    script.push_str(&format!("    [Test]\n    public void {method}()\n    {{\n"));
    script.push_str(&body);
    script.push_str("        var result = driver.FindElement(By.ClassName(\"result\")).Text;\n");
    script.push_str("        Assert.IsNotNull(result);\n    }\n\n");
    script.push_str("    [TearDown]\n    public void Cleanup()\n    {\n");
    script.push_str("        driver?.Quit();\n    }\n}\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_model::{RequirementKind, ValidationKind};

    fn requirement() -> Requirement {
        Requirement {
            id: "DOC-REQ-001".into(),
            source_ref: "document-upload".into(),
            kind: RequirementKind::Performance,
            text: "Pages shall load within 2 seconds".into(),
            testable: true,
            ambiguity_score: 0.0,
            scenario_hints: vec![],
            traceability_id: "DOC-TRACE-001".into(),
        }
    }

    fn steps() -> Vec<TestStep> {
        vec![
            TestStep::new(1, "Open page", "Page opens", ValidationKind::Assertion),
            TestStep::new(2, "Measure load", "Under 2s", ValidationKind::Performance),
        ]
    }

    #[test]
    fn python_script_embeds_requirement_and_kind() {
        let script = render_script("python", &requirement(), CaseKind::Boundary, &steps());
        assert!(script.contains("class TestDOC_REQ_001:"));
        assert!(script.contains("Requirement: DOC-REQ-001 - Pages shall load within 2 seconds"));
        assert!(script.contains("Test Type: boundary"));
        assert!(script.contains("def test_doc_req_001_boundary(self):"));
        assert!(script.contains("yield"));
        assert!(script.contains("# Step 2: Measure load -> Under 2s"));
    }

    #[test]
    fn javascript_script_uses_playwright_hooks() {
        let script = render_script("JavaScript", &requirement(), CaseKind::Negative, &steps());
        assert!(script.contains("test.describe('DOC-REQ-001 - Pages shall load within 2 seconds'"));
        assert!(script.contains("test.beforeEach"));
        assert!(script.contains("test('negative scenario'"));
        assert!(script.contains(".error"));
    }

    #[test]
    fn csharp_script_uses_nunit_fixture() {
        let script = render_script("csharp", &requirement(), CaseKind::Positive, &steps());
        assert!(script.contains("public class DOC_REQ_001Tests"));
        assert!(script.contains("[SetUp]"));
        assert!(script.contains("[TearDown]"));
        assert!(script.contains("public void Test_DOC_REQ_001_positive()"));
    }

    #[test]
    fn unsupported_dialect_renders_nothing() {
        assert!(render_script("cobol", &requirement(), CaseKind::Positive, &steps()).is_empty());
    }

    #[test]
    fn frameworks_per_dialect() {
        assert_eq!(frameworks_for("python")[0], "pytest");
        assert!(frameworks_for("csharp").contains(&"specflow"));
        assert!(frameworks_for("ruby").is_empty());
    }

    #[test]
    fn step_actions_are_escaped_per_dialect() {
        let steps = vec![TestStep::new(
            1,
            "Send \"quoted\" C:\\path\u{1b}[0m\nnext",
            "Handled",
            ValidationKind::Assertion,
        )];
        let escaped = r#""Send \"quoted\" C:\\path\u001b[0m\nnext""#;

        let python = render_script("python", &requirement(), CaseKind::Positive, &steps);
        assert!(python.contains(&format!("self.perform({escaped})")), "{python}");
        let javascript = render_script("javascript", &requirement(), CaseKind::Positive, &steps);
        assert!(javascript.contains(&format!("test.step({escaped}, async")), "{javascript}");
        let csharp = render_script("csharp", &requirement(), CaseKind::Positive, &steps);
        assert!(csharp.contains(&format!("Perform({escaped});")), "{csharp}");

        for script in [&python, &javascript, &csharp] {
            assert!(!script.contains('\u{1b}'));
            assert!(!script.contains("\\u{1b}"));
            assert!(script.contains("Step 1: Send \"quoted\" C:\\path[0m next -> Handled"));
        }
        assert_eq!(
            ScriptDialect::CSharp.string_literal("a\u{2028}b"),
            r#""a\u2028b""#
        );
        assert_eq!(ScriptDialect::Python.string_literal("a\u{2028}b"), "\"a\u{2028}b\"");
    }

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(identifier("MLB-15"), "MLB_15");
        assert_eq!(identifier("15.a"), "_15_a");
    }
}
