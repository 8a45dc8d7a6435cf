//! Terminal tables for command output.

use crate::analytics::{
    CashflowPoint, CategorySlice, Change, Dashboard, Direction, ExpensePoint, Kpi, Report,
    RevenuePoint, TransactionRow,
};
use crate::model::{
    format_money, Account, OrgId, Organization, OrganizationSummary, Transaction, User,
};
use comfy_table::{Cell, CellAlignment, Table, TableComponent};

fn table() -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);
    table
}

fn money(value: f64) -> Cell {
    Cell::new(format_money(value)).set_alignment(CellAlignment::Right)
}

fn percent(value: f64) -> Cell {
    Cell::new(format!("{value:+.1}%")).set_alignment(CellAlignment::Right)
}

fn kpi_row(name: &str, kpi: &Kpi, as_money: bool) -> Vec<Cell> {
    let value = if as_money {
        money(kpi.value)
    } else {
        Cell::new(kpi.value).set_alignment(CellAlignment::Right)
    };
    vec![
        Cell::new(name),
        value,
        percent(kpi.change),
        Cell::new(serde_plain::to_string(&kpi.trend).unwrap_or_default()),
    ]
}

fn change_row(name: &str, change: &Change, as_money: bool) -> Vec<Cell> {
    let value = if as_money {
        money(change.value)
    } else {
        Cell::new(format!("{:.1}%", change.value)).set_alignment(CellAlignment::Right)
    };
    vec![Cell::new(name), value, percent(change.change)]
}

fn field(name: &str, value: impl ToString) -> Vec<Cell> {
    vec![Cell::new(name), Cell::new(value)]
}

fn series(revenue: &[RevenuePoint], expenses: &[ExpensePoint]) -> Table {
    let mut table = table();
    table.set_header(vec!["Month", "Revenue", "Target", "Expenses", "Budget"]);
    let mut months: Vec<(i32, u32, &str)> = revenue
        .iter()
        .map(|p| (p.year, p.month_number, p.month.as_str()))
        .chain(
            expenses
                .iter()
                .map(|p| (p.year, p.month_number, p.month.as_str())),
        )
        .collect();
    months.sort_by_key(|(year, month, _)| (*year, *month));
    months.dedup_by_key(|(year, month, _)| (*year, *month));
    for (year, month, label) in months {
        let r = revenue
            .iter()
            .find(|p| p.year == year && p.month_number == month);
        let e = expenses
            .iter()
            .find(|p| p.year == year && p.month_number == month);
        let blank = || Cell::new("");
        table.add_row(vec![
            Cell::new(label),
            r.map(|p| money(p.revenue)).unwrap_or_else(blank),
            r.map(|p| money(p.target)).unwrap_or_else(blank),
            e.map(|p| money(p.expenses)).unwrap_or_else(blank),
            e.map(|p| money(p.budget)).unwrap_or_else(blank),
        ]);
    }
    table
}

fn cashflow(points: &[CashflowPoint]) -> Table {
    let mut table = table();
    table.set_header(vec!["Month", "Inflow", "Outflow", "Net"]);
    for p in points {
        table.add_row(vec![
            Cell::new(&p.month),
            money(p.inflow),
            money(p.outflow),
            money(p.net),
        ]);
    }
    table
}

fn categories(slices: &[CategorySlice]) -> Table {
    let mut table = table();
    table.set_header(vec!["Category", "Amount", "Share"]);
    for s in slices {
        table.add_row(vec![
            Cell::new(&s.category),
            money(s.amount),
            Cell::new(format!("{:.1}%", s.percentage)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub(super) fn rows(rows: &[TransactionRow]) -> String {
    let mut table = table();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount"]);
    for row in rows {
        let signed = match row.direction {
            Direction::Income => row.amount,
            Direction::Expense => -row.amount,
        };
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(row.date.as_deref().unwrap_or("")),
            Cell::new(&row.description),
            Cell::new(&row.category),
            money(signed),
        ]);
    }
    table.to_string()
}

pub(super) fn transaction(txn: &Transaction) -> String {
    let mut table = table();
    table.set_header(vec!["Field", "Value"]);
    let accounts = format!(
        "{} -> {}",
        txn.from_account_id.as_deref().unwrap_or("-"),
        txn.to_account_id.as_deref().unwrap_or("-")
    );
    table.add_row(field("ID", &txn.id));
    table.add_row(field("Type", txn.kind));
    table.add_row(field(
        "Amount",
        format!("{} {}", txn.amount.display_with_commas(), txn.currency),
    ));
    table.add_row(field("Date", txn.date.as_deref().unwrap_or("")));
    table.add_row(field("Description", txn.description_or_default()));
    table.add_row(field("Category", txn.category_or_default()));
    table.add_row(field("Tags", txn.tags.join(", ")));
    table.add_row(field("Accounts", accounts));
    table.to_string()
}

pub(super) fn accounts(accounts: &[Account]) -> String {
    let mut table = table();
    table.set_header(vec!["ID", "Name", "Type", "Balance", "Currency", "Active"]);
    for a in accounts {
        table.add_row(vec![
            Cell::new(&a.id),
            Cell::new(&a.name),
            Cell::new(a.kind),
            money(a.balance.to_f64()),
            Cell::new(&a.currency),
            Cell::new(if a.is_active { "yes" } else { "no" }),
        ]);
    }
    table.to_string()
}

pub(super) fn organizations(orgs: &[Organization], selected: Option<&OrgId>) -> String {
    let mut table = table();
    table.set_header(vec!["", "ID", "Name", "Role"]);
    for org in orgs {
        let marker = match selected {
            Some(selected) if selected.as_str() == org.id => "*",
            _ => "",
        };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&org.id),
            Cell::new(&org.name),
            Cell::new(org.role),
        ]);
    }
    table.to_string()
}

pub(super) fn organization_summary(summary: &OrganizationSummary) -> String {
    let mut table = table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(field("ID", &summary.id));
    table.add_row(field("Name", &summary.name));
    table.add_row(field("Members", summary.members_count));
    table.add_row(field("Accounts", summary.accounts_count));
    table.add_row(field("Transactions", summary.transactions_count));
    table.add_row(vec![
        Cell::new("Total assets"),
        money(summary.total_assets.to_f64()),
    ]);
    table.add_row(vec![
        Cell::new("Total liabilities"),
        money(summary.total_liabilities.to_f64()),
    ]);
    table.add_row(vec![Cell::new("Net worth"), money(summary.net_worth.to_f64())]);
    table.to_string()
}

pub(super) fn user(user: &User) -> String {
    let mut table = table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(field("ID", &user.id));
    table.add_row(field("Email", &user.email));
    table.add_row(field("Name", user.name.as_deref().unwrap_or("")));
    table.add_row(field("Member since", user.created_at.as_deref().unwrap_or("")));
    table.to_string()
}

pub(super) fn dashboard(dashboard: &Dashboard) -> String {
    let k = &dashboard.kpis;
    let mut kpis = table();
    kpis.set_header(vec!["KPI", "Value", "Change", "Trend"]);
    kpis.add_row(kpi_row("Revenue", &k.revenue, true));
    kpis.add_row(kpi_row("Expenses", &k.expenses, true));
    kpis.add_row(kpi_row("Net profit", &k.net_profit, true));
    kpis.add_row(kpi_row("Active accounts", &k.active_accounts, false));
    kpis.add_row(vec![
        Cell::new("Total balance"),
        money(k.total_balance),
        Cell::new(""),
        Cell::new(""),
    ]);

    [
        kpis.to_string(),
        series(&dashboard.revenue, &dashboard.expenses).to_string(),
        cashflow(&dashboard.cashflow).to_string(),
        categories(&dashboard.categories).to_string(),
        rows(&dashboard.recent),
    ]
    .join("\n\n")
}

pub(super) fn report(report: &Report) -> String {
    let s = &report.summary;
    let mut summary = table();
    summary.set_header(vec!["Summary", "Value", "Change"]);
    summary.add_row(change_row("Revenue", &s.revenue, true));
    summary.add_row(change_row("Expenses", &s.expenses, true));
    summary.add_row(change_row("Net profit", &s.net_profit, true));
    summary.add_row(change_row("Profit margin", &s.profit_margin, false));

    [
        summary.to_string(),
        series(&report.revenue, &report.expenses).to_string(),
        cashflow(&report.cashflow).to_string(),
        categories(&report.categories).to_string(),
    ]
    .join("\n\n")
}
