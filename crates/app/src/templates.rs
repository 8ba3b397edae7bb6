//! Canned prompts offered in the Build tab.

pub struct Template {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "Python: Hello World CLI",
        prompt: "Build a Python CLI that prints 'Hello, Workbench!'",
    },
    Template {
        name: "Python: To-do list (CLI)",
        prompt: "Build a Python CLI to add/list/remove tasks and save them to tasks.json.",
    },
    Template {
        name: "Python: Login system (JSON users)",
        prompt: "Build a Python CLI login system with register/login/logout, storing users in users.json (username + hashed password).",
    },
    Template {
        name: "Streamlit: Simple dashboard",
        prompt: "Build a Streamlit app with a sidebar, a main chart using random data, and a table view.",
    },
    Template {
        name: "Flask: Minimal API with /hello",
        prompt: "Build a Flask app with a /hello endpoint returning JSON {message: 'Hello from Workbench'}.",
    },
];
