//! Host artifact generation — pure functions, no I/O, no async.
//!
//! Each function accepts a registry record and returns a `String` containing
//! the artifact content. The caller is responsible for writing to disk.
//! Output depends only on the inputs, so re-applying an unchanged record
//! writes byte-identical files.

#![allow(clippy::format_push_string)]

use std::path::Path;

use appfleet_common::{Application, RuntimeFlavor};

/// Host-side values that shape the service unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    pub user: &'a str,
    pub group: &'a str,
    pub workers: u32,
}

/// Loopback address the process manager binds to.
#[must_use]
pub fn bind_address(app: &Application) -> String {
    format!("127.0.0.1:{}", app.port)
}

/// Process-manager invocation for the record's runtime flavor.
#[must_use]
pub fn exec_start(app: &Application, workers: u32) -> String {
    let bin = app.runtime_bin(app.flavor.binary());
    let bind = bind_address(app);
    let module = &app.entry_module;
    match app.flavor {
        RuntimeFlavor::Gunicorn => format!(
            "{} --workers {workers} --bind {bind} {module}:app",
            bin.display()
        ),
        RuntimeFlavor::Uwsgi => format!(
            "{} --master --processes {workers} --http-socket {bind} --chdir {} --module {module}:app --die-on-term",
            bin.display(),
            app.root_dir.display()
        ),
    }
}

/// Generate `<service_id>.service` content — systemd unit that restarts on
/// failure and binds the application to loopback.
///
/// Returns the unit file string — does NOT write to disk.
#[must_use]
pub fn service_unit(app: &Application, ctx: &UnitContext<'_>) -> String {
    let name = &app.name;
    let root = app.root_dir.display();
    let bin_dir = app.runtime_dir.join("bin");

    let mut out = String::new();
    out.push_str(&format!("# Generated by appfleet for {name} - DO NOT EDIT\n"));
    out.push_str("[Unit]\n");
    out.push_str(&format!("Description=appfleet application {name} ({})\n", app.flavor));
    out.push_str("After=network.target\n");
    out.push('\n');
    out.push_str("[Service]\n");
    out.push_str("Type=simple\n");
    out.push_str(&format!("User={}\n", ctx.user));
    out.push_str(&format!("Group={}\n", ctx.group));
    out.push_str(&format!("WorkingDirectory={root}\n"));
    out.push_str(&format!(
        "Environment=\"PATH={}:/usr/local/bin:/usr/bin:/bin\"\n",
        bin_dir.display()
    ));
    out.push_str(&format!("Environment=\"APPFLEET_BIND={}\"\n", bind_address(app)));
    out.push_str(&format!("ExecStart={}\n", exec_start(app, ctx.workers)));
    out.push_str("Restart=on-failure\n");
    out.push_str("RestartSec=5\n");
    out.push('\n');
    out.push_str("[Install]\n");
    out.push_str("WantedBy=multi-user.target\n");
    out
}

/// Generate the reverse-proxy site for one application.
///
/// Returns the nginx `server` block — does NOT write to disk.
#[must_use]
pub fn proxy_site(app: &Application, log_dir: &Path) -> String {
    let id = &app.service_id;
    let log_dir = log_dir.display();

    let mut out = String::new();
    out.push_str(&format!("# Generated by appfleet for {} - DO NOT EDIT\n", app.name));
    out.push_str("server {\n");
    out.push_str("    listen 80;\n");
    out.push_str("    listen [::]:80;\n");
    out.push_str(&format!("    server_name {};\n", app.server_name));
    out.push('\n');
    out.push_str(&format!("    access_log {log_dir}/{id}.access.log;\n"));
    out.push_str(&format!("    error_log {log_dir}/{id}.error.log;\n"));
    out.push('\n');
    out.push_str("    location /static/ {\n");
    out.push_str(&format!("        alias {}/static/;\n", app.root_dir.display()));
    out.push_str("    }\n");
    out.push('\n');
    out.push_str("    location / {\n");
    out.push_str(&format!("        proxy_pass http://{};\n", bind_address(app)));
    out.push_str("        proxy_set_header Host $host;\n");
    out.push_str("        proxy_set_header X-Real-IP $remote_addr;\n");
    out.push_str("        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n");
    out.push_str("        proxy_set_header X-Forwarded-Proto $scheme;\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

/// Entry-point filenames recognised when importing an existing tree, in
/// order of preference.
pub const ENTRY_POINT_CANDIDATES: &[&str] = &["wsgi.py", "app.py", "main.py", "application.py"];

/// Module name for an entry-point filename (`wsgi.py` → `wsgi`).
#[must_use]
pub fn module_for(file_name: &str) -> &str {
    file_name.strip_suffix(".py").unwrap_or(file_name)
}

/// Subdirectories every application tree gets during full setup.
pub const STANDARD_SUBDIRS: &[&str] = &["static", "templates", "logs"];

/// Minimal entry point written for newly created applications.
#[must_use]
pub fn scaffold_entry(app_name: &str) -> String {
    format!(
        "from flask import Flask\n\
         \n\
         app = Flask(__name__)\n\
         \n\
         \n\
         @app.route(\"/\")\n\
         def index():\n    \
             return \"{app_name} is running\\n\"\n\
         \n\
         \n\
         if __name__ == \"__main__\":\n    \
             app.run()\n"
    )
}

/// Dependency list installed into the isolated runtime when present.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// `requirements.txt` written alongside the scaffolded entry point.
#[must_use]
pub fn scaffold_requirements() -> &'static str {
    "flask\n"
}
