//! Server-rendered form page.

/// Outcome shown under the form after a submission
#[derive(Debug, Clone)]
pub struct ResultView {
    pub prediction: &'static str,
    pub label: u8,
    pub model_used: &'static str,
    pub probability: f64,
}

struct NumberInput {
    name: &'static str,
    label: &'static str,
    step: &'static str,
}

struct SelectInput {
    name: &'static str,
    label: &'static str,
    options: &'static [(i64, &'static str)],
}

const NUMBER_INPUTS: &[NumberInput] = &[
    NumberInput { name: "age", label: "Age (years)", step: "1" },
    NumberInput { name: "trestbps", label: "Resting blood pressure (mm Hg)", step: "1" },
    NumberInput { name: "chol", label: "Serum cholesterol (mg/dl)", step: "1" },
    NumberInput { name: "thalach", label: "Maximum heart rate achieved", step: "1" },
    NumberInput { name: "oldpeak", label: "ST depression (oldpeak)", step: "0.1" },
];

const SELECT_INPUTS: &[SelectInput] = &[
    SelectInput { name: "sex", label: "Sex", options: &[(0, "Female"), (1, "Male")] },
    SelectInput {
        name: "cp",
        label: "Chest pain type",
        options: &[
            (0, "Typical angina"),
            (1, "Atypical angina"),
            (2, "Non-anginal pain"),
            (3, "Asymptomatic"),
        ],
    },
    SelectInput {
        name: "fbs",
        label: "Fasting blood sugar > 120 mg/dl",
        options: &[(0, "No"), (1, "Yes")],
    },
    SelectInput {
        name: "restecg",
        label: "Resting ECG",
        options: &[
            (0, "Normal"),
            (1, "ST-T wave abnormality"),
            (2, "Left ventricular hypertrophy"),
        ],
    },
    SelectInput {
        name: "exang",
        label: "Exercise induced angina",
        options: &[(0, "No"), (1, "Yes")],
    },
    SelectInput {
        name: "slope",
        label: "Slope of peak exercise ST segment",
        options: &[(0, "Upsloping"), (1, "Flat"), (2, "Downsloping")],
    },
    SelectInput {
        name: "ca",
        label: "Major vessels colored by fluoroscopy",
        options: &[(0, "0"), (1, "1"), (2, "2"), (3, "3"), (4, "4")],
    },
    SelectInput {
        name: "thal",
        label: "Thalassemia",
        options: &[(0, "Unknown"), (1, "Normal"), (2, "Fixed defect"), (3, "Reversible defect")],
    },
];

const MODEL_OPTIONS: &[(&str, &str)] = &[("logistic", "Logistic Regression"), ("tree", "Decision Tree")];

/// Render the form page, with the prediction block when `result` is set
pub fn render_page(title: &str, result: Option<&ResultView>) -> String {
    let title = escape_html(title);
    let mut html = String::with_capacity(4096);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main>
<h1>{title}</h1>
<form method="post" action="/predict">
"#
    ));

    for input in NUMBER_INPUTS {
        html.push_str(&format!(
            r#"<label for="{name}">{label}</label>
<input type="number" id="{name}" name="{name}" step="{step}" min="0" required>
"#,
            name = input.name,
            label = escape_html(input.label),
            step = input.step,
        ));
    }

    for select in SELECT_INPUTS {
        html.push_str(&format!(
            r#"<label for="{name}">{label}</label>
<select id="{name}" name="{name}" required>
"#,
            name = select.name,
            label = escape_html(select.label),
        ));
        for (code, text) in select.options {
            html.push_str(&format!(
                "<option value=\"{code}\">{}</option>\n",
                escape_html(text)
            ));
        }
        html.push_str("</select>\n");
    }

    html.push_str("<label for=\"model\">Model</label>\n<select id=\"model\" name=\"model\">\n");
    for (value, text) in MODEL_OPTIONS {
        html.push_str(&format!(
            "<option value=\"{value}\">{}</option>\n",
            escape_html(text)
        ));
    }
    html.push_str("</select>\n<button type=\"submit\">Predict</button>\n</form>\n");

    if let Some(result) = result {
        let class = if result.label == 1 { "positive" } else { "negative" };
        html.push_str(&format!(
            r#"<section class="result {class}">
<h2 class="prediction">{prediction}</h2>
<p class="model-used">Model used: {model}</p>
<p class="probability">Probability of heart disease: {probability:.1}%</p>
</section>
"#,
            prediction = escape_html(result.prediction),
            model = escape_html(result.model_used),
            probability = result.probability * 100.0,
        ));
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
