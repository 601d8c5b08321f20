//! Server-rendered HTML for the filter builder pages.

use cantus_filter_core::{
    Attribute, ChoiceCatalog, FieldKey, SelectionMode, NAME_MAX_CHARS, OTHER_SENTINEL,
};

use crate::session::Submission;

pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Filter for PyCantus</title>
    <style>{CSS}</style>
</head>
<body>
    <header>
        <nav>
            <a href="/filter" class="logo">Filter for PyCantus</a>
            <a href="/filter/help">help</a>
            <a href="/filter/about">about</a>
            <a href="/filter/contact">contact</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#,
        title = html_escape(title),
    )
}

/// The filter form. `name` and `error` are echoed back after a failed submit.
pub fn filter_form(catalog: &ChoiceCatalog, name: &str, error: Option<&str>) -> String {
    let error_block = error
        .map(|msg| format!(r#"<p class="error">{}</p>"#, html_escape(msg)))
        .unwrap_or_default();
    let mut sections = String::new();
    for mode in SelectionMode::ALL {
        let heading = match mode {
            SelectionMode::Include => "Include values",
            SelectionMode::Exclude => "Exclude values",
        };
        sections.push_str(&format!("<fieldset><legend>{heading}</legend>\n"));
        for attribute in Attribute::ALL {
            let key = FieldKey::new(attribute, mode);
            sections.push_str(&format!(
                "<div class=\"field\"><label>{}</label>\n{}</div>\n",
                html_escape(attribute.label()),
                repeatable_input(key, catalog.choices(attribute)),
            ));
        }
        sections.push_str("</fieldset>\n");
    }
    let content = format!(
        r#"{error_block}
<form method="post" action="/filter">
    <div class="field">
        <label for="id_name">Name</label>
        <input type="text" name="name" id="id_name" maxlength="{NAME_MAX_CHARS}" value="{name}"
               placeholder="filter_for_my_great_experiment_XY" required>
    </div>
    {sections}
    <button type="submit">Create filter</button>
</form>"#,
        name = html_escape(name),
    );
    base_template("Create filter", &content)
}

/// Repeatable select with an "other" free-text companion.
///
/// Position 0 is rendered on load; changing the select at the highest
/// position appends the next one, so posted indices are always contiguous.
pub fn repeatable_input(key: FieldKey, choices: &[String]) -> String {
    let prefix = key.prefix();
    format!(
        r#"<div id="repeatable-{prefix}" class="repeatable-field"></div>
{choices_script}
<script>
(function() {{
    const prefix = "{prefix}";
    const container = document.getElementById("repeatable-" + prefix);
    const choices = JSON.parse(document.getElementById(prefix + "_choices").textContent);
    let highest = 0;

    function createField(index) {{
        const row = document.createElement("div");
        const select = document.createElement("select");
        select.name = prefix + "_" + index;
        select.id = "id_" + prefix + "_" + index;
        select.add(new Option("-- Select --", ""));
        choices.forEach((choice) => select.add(new Option(choice, choice)));
        select.add(new Option("Other", "{OTHER_SENTINEL}"));

        const input = document.createElement("input");
        input.type = "text";
        input.name = prefix + "_{OTHER_SENTINEL}_" + index;
        input.id = "id_" + prefix + "_{OTHER_SENTINEL}_" + index;
        input.placeholder = "Enter custom...";
        input.style.display = "none";

        select.addEventListener("change", () => {{
            input.style.display = select.value === "{OTHER_SENTINEL}" ? "inline-block" : "none";
            if (index === highest) {{
                highest += 1;
                createField(highest);
            }}
        }});

        row.appendChild(select);
        row.appendChild(input);
        container.appendChild(row);
    }}

    createField(0);
}})();
</script>"#,
        choices_script = json_script(&format!("{prefix}_choices"), choices),
    )
}

/// Preview of the stored selections with the export link.
pub fn download_page(submission: &Submission) -> String {
    let mut content = format!(
        "<p>Filter <strong>{}</strong> is ready.</p>\n",
        html_escape(&submission.name)
    );
    for mode in SelectionMode::ALL {
        let heading = match mode {
            SelectionMode::Include => "Included",
            SelectionMode::Exclude => "Excluded",
        };
        let mut rows = String::new();
        for attribute in Attribute::ALL {
            if let Some(values) = submission.values.get(FieldKey::new(attribute, mode)) {
                let items: Vec<String> = values.iter().map(|value| html_escape(value)).collect();
                rows.push_str(&format!(
                    "<tr><th>{}</th><td>{}</td></tr>\n",
                    html_escape(attribute.label()),
                    items.join(", ")
                ));
            }
        }
        if rows.is_empty() {
            rows.push_str("<tr><td colspan=\"2\" class=\"muted\">nothing selected</td></tr>\n");
        }
        content.push_str(&format!("<h2>{heading}</h2>\n<table>\n{rows}</table>\n"));
    }
    content.push_str(
        r#"<p><a class="button" href="/filter/download?download=1">Download YAML</a>
<a href="/filter">Start over</a></p>"#,
    );
    base_template("Your filter", &content)
}

pub fn help_page() -> String {
    base_template(
        "Help",
        r#"<p>Give the filter a name; it becomes the name of the downloaded file.</p>
<p>For each attribute choose values to include or exclude. Picking a value adds
another selector below it. Choose <em>Other</em> to type a value that is not in
the list.</p>
<p>Empty selectors are ignored and repeated values are kept once. The exported
YAML file can be passed to the PyCantus filtering functions.</p>"#,
    )
}

pub fn about_page() -> String {
    base_template(
        "About",
        r#"<p>This tool builds filter settings for chant datasets processed with the
PyCantus library. Choices offered in the form come from the Cantus reference
tables for genres, offices, feasts, databases and sources.</p>"#,
    )
}

pub fn contact_page() -> String {
    base_template(
        "Contact",
        r#"<p>Questions and bug reports are welcome in the project issue tracker.</p>"#,
    )
}

/// Embeds `value` as JSON that cannot terminate the surrounding script element.
fn json_script<T: serde::Serialize + ?Sized>(id: &str, value: &T) -> String {
    let json = serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003C")
        .replace('>', "\\u003E")
        .replace('&', "\\u0026");
    format!(
        r#"<script type="application/json" id="{}">{json}</script>"#,
        html_escape(id)
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CSS: &str = r#"
body { font-family: sans-serif; margin: 0; color: #222; }
header { background: #f4f1ea; border-bottom: 1px solid #ccc; padding: 0.5em 1em; }
nav a { margin-right: 1em; color: #0066cc; text-decoration: none; }
nav .logo { font-weight: bold; color: #222; }
main { max-width: 60em; margin: 1em auto; padding: 0 1em; }
fieldset { margin-bottom: 1em; }
.field { margin-bottom: 0.75em; }
.field label { display: block; font-weight: bold; }
.repeatable-field select, .repeatable-field input { margin: 0.2em 0.5em 0.2em 0; }
.error { color: #b00020; font-weight: bold; }
.muted { color: #666; }
table { border-collapse: collapse; margin-bottom: 1em; }
th, td { text-align: left; padding: 0.25em 0.75em; border-bottom: 1px solid #eee; }
"#;
