//! Compiled-in school administration catalog

use std::sync::OnceLock;

use crate::catalog::{Catalog, Module, SubModule};
use crate::constants::BUILTIN_CATALOG_VERSION;

static CATALOG: OnceLock<Catalog> = OnceLock::new();

const CRUD: &[&str] = &["Add", "Edit", "Delete"];
const NONE: &[&str] = &[];

type Subs = &'static [(&'static str, &'static [&'static str])];

enum Def {
    Flat(&'static [&'static str]),
    Tree(Subs),
    Verbs,
}

const MODULES: &[(&str, &str, Def)] = &[
    ("dashboard", "Dashboard", Def::Flat(&[
        "Student Count",
        "Staff Count",
        "Fees Collection Chart",
        "Expense Chart",
        "Attendance Chart",
        "Notice Board Widget",
    ])),
    ("students", "Student Information", Def::Verbs),
    ("admissions", "Online Admission", Def::Verbs),
    ("academics", "Academics", Def::Tree(&[
        ("Class Timetable", CRUD),
        ("Teachers Timetable", NONE),
        ("Assign Class Teacher", CRUD),
        ("Promote Students", NONE),
        ("Subject Group", CRUD),
        ("Subjects", CRUD),
        ("Class", CRUD),
        ("Sections", CRUD),
    ])),
    ("attendance", "Attendance", Def::Tree(&[
        ("Student Attendance", &["Add", "Edit"]),
        ("Approve Leave", &["Add", "Delete"]),
        ("Attendance By Date", NONE),
    ])),
    ("examinations", "Examinations", Def::Tree(&[
        ("Exam Group", CRUD),
        ("Exam Schedule", &["Add", "Edit"]),
        ("Marks Grade", CRUD),
        ("Admit Card", &["Add", "Edit", "Delete", "Print"]),
        ("Exam Result", NONE),
    ])),
    ("fees", "Fees Collection", Def::Tree(&[
        ("Collect Fees", &["Add", "Delete"]),
        ("Fees Invoice", CRUD),
        ("Search Fees Payment", NONE),
        ("Search Due Fees", NONE),
        ("Fees Master", CRUD),
        ("Fees Group", CRUD),
        ("Fees Type", CRUD),
        ("Fees Discount", CRUD),
        ("Fees Carry Forward", NONE),
        ("Fees Reminder", &["Edit"]),
    ])),
    ("income", "Income", Def::Verbs),
    ("expenses", "Expenses", Def::Verbs),
    ("payroll", "Payroll", Def::Tree(&[
        ("Staff Payroll", CRUD),
        ("Payslip", &["Add", "Delete", "Print"]),
        ("Payroll Report", NONE),
    ])),
    ("human-resource", "Human Resource", Def::Tree(&[
        ("Staff", CRUD),
        ("Staff Attendance", &["Add", "Edit"]),
        ("Apply Leave", CRUD),
        ("Leave Types", CRUD),
        ("Department", CRUD),
        ("Designation", CRUD),
        ("Disable Staff", NONE),
    ])),
    ("inventory", "Inventory", Def::Tree(&[
        ("Issue Item", &["Add", "Delete"]),
        ("Add Item Stock", CRUD),
        ("Add Item", CRUD),
        ("Item Category", CRUD),
        ("Item Store", CRUD),
        ("Item Supplier", CRUD),
    ])),
    ("library", "Library", Def::Verbs),
    ("transport", "Transport", Def::Verbs),
    ("communications", "Communicate", Def::Tree(&[
        ("Notice Board", CRUD),
        ("Send Email", NONE),
        ("Send SMS", NONE),
        ("Email / SMS Log", NONE),
    ])),
    ("reports", "Reports", Def::Flat(&[
        "Student Report",
        "Guardian Report",
        "Finance Report",
        "Attendance Report",
        "Examination Report",
        "Payroll Report",
        "Inventory Report",
        "Audit Trail Report",
    ])),
    ("settings", "System Settings", Def::Flat(&[
        "General Setting",
        "Session Setting",
        "Notification Setting",
        "SMS Setting",
        "Payment Methods",
        "Roles Permissions",
        "Backup / Restore",
    ])),
];

fn build() -> Catalog {
    let modules = MODULES
        .iter()
        .map(|(name, title, def)| {
            let m = match def {
                Def::Flat(toggles) => Module::flat(*name, toggles.iter().copied()),
                Def::Tree(subs) => Module::tree(
                    *name,
                    subs.iter().map(|(s, a)| SubModule::with_actions(*s, a.iter().copied())).collect(),
                ),
                Def::Verbs => Module::verbs(*name),
            };
            m.titled(*title)
        })
        .collect();
    // Checked by tests/catalog.rs
    Catalog::new_unchecked(BUILTIN_CATALOG_VERSION, modules)
}

/// Shared handle to the compiled-in catalog
pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(build)
}
