// ABOUTME: Recursive AST walk flagging write-class operations anywhere in a parsed statement
// ABOUTME: Explicit per-node-kind field policy: recurse structural children, skip identifier fields
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Structural Walk
//!
//! Walks every node of a parsed statement and records a
//! `DANGEROUS_OPERATION` issue for any node whose statement kind is a
//! write-class operation; the walk stops descending into that subtree but
//! continues with its siblings, so all violations in a statement are
//! reported together.
//!
//! The field policy is written out as explicit match arms per node kind,
//! keyed to the sqlparser 0.57 grammar: fields that hold child queries,
//! set expressions, table factors, or expressions are recursed; fields
//! that hold identifiers, aliases, or literal values are skipped so a
//! column literally named `insert` is never flagged. Hive-only clauses
//! (`CLUSTER BY`, `DISTRIBUTE BY`, `SORT BY`) and `ORDER BY`/`LIMIT` are
//! skipped: they cannot introduce a write on any engine this gate fronts.

use crate::errors::{IssueCode, ValidationIssue};
use sqlparser::ast::{
    Cte, Expr, FunctionArg, FunctionArgExpr, GroupByExpr, JoinConstraint, JoinOperator, Query,
    Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, With,
};

/// Walk all parsed statements, appending one issue per write-class node.
pub fn collect_dangerous_operations(statements: &[Statement], issues: &mut Vec<ValidationIssue>) {
    for statement in statements {
        walk_statement(statement, issues);
    }
}

fn dangerous(keyword: &str, issues: &mut Vec<ValidationIssue>) {
    issues.push(ValidationIssue::new(
        IssueCode::DangerousOperation,
        format!("{keyword} operations are not permitted in analytic queries"),
    ));
}

/// Write-class keyword for a statement node, or `None` when the node is a
/// read form that should be recursed instead.
fn write_class(statement: &Statement) -> Option<&'static str> {
    match statement {
        Statement::Query(_) | Statement::Explain { .. } => None,
        Statement::Insert { .. } => Some("INSERT"),
        Statement::Update { .. } => Some("UPDATE"),
        Statement::Delete { .. } => Some("DELETE"),
        Statement::Merge { .. } => Some("MERGE"),
        Statement::Truncate { .. } => Some("TRUNCATE"),
        Statement::Copy { .. } | Statement::CopyIntoSnowflake { .. } => Some("COPY"),
        Statement::Grant { .. } => Some("GRANT"),
        Statement::Revoke { .. } => Some("REVOKE"),
        Statement::Call { .. } => Some("CALL"),
        Statement::Execute { .. } => Some("EXECUTE"),
        Statement::CreateTable { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateTrigger { .. }
        | Statement::CreateType { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreatePolicy { .. } => Some("CREATE"),
        Statement::AlterTable { .. }
        | Statement::AlterView { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterRole { .. }
        | Statement::AlterPolicy { .. } => Some("ALTER"),
        Statement::Drop { .. }
        | Statement::DropFunction { .. }
        | Statement::DropProcedure { .. }
        | Statement::DropTrigger { .. }
        | Statement::DropPolicy { .. } => Some("DROP"),
        // Anything else (SET, transaction control, vendor statements) is
        // not a read form either
        _ => Some("non-SELECT"),
    }
}

fn walk_statement(statement: &Statement, issues: &mut Vec<ValidationIssue>) {
    if let Some(keyword) = write_class(statement) {
        dangerous(keyword, issues);
        return;
    }
    match statement {
        Statement::Query(query) => walk_query(query, issues),
        Statement::Explain { statement, .. } => walk_statement(statement, issues),
        _ => {}
    }
}

fn walk_query(query: &Query, issues: &mut Vec<ValidationIssue>) {
    if let Some(with) = &query.with {
        walk_with(with, issues);
    }
    walk_set_expr(&query.body, issues);
}

fn walk_with(with: &With, issues: &mut Vec<ValidationIssue>) {
    for cte in &with.cte_tables {
        walk_cte(cte, issues);
    }
}

fn walk_cte(cte: &Cte, issues: &mut Vec<ValidationIssue>) {
    // cte.alias is an identifier field: skipped
    walk_query(&cte.query, issues);
}

fn walk_set_expr(set_expr: &SetExpr, issues: &mut Vec<ValidationIssue>) {
    match set_expr {
        SetExpr::Select(select) => walk_select(select, issues),
        SetExpr::Query(query) => walk_query(query, issues),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, issues);
            walk_set_expr(right, issues);
        }
        // Literal rows and bare table references carry no child statements
        SetExpr::Values(_) | SetExpr::Table(_) => {}
        // A set expression can hold a write statement directly
        SetExpr::Insert(inner) | SetExpr::Update(inner) | SetExpr::Delete(inner) => {
            walk_statement(inner, issues);
        }
    }
}

fn walk_select(select: &Select, issues: &mut Vec<ValidationIssue>) {
    for item in &select.projection {
        walk_select_item(item, issues);
    }
    for table_with_joins in &select.from {
        walk_table_with_joins(table_with_joins, issues);
    }
    if let Some(selection) = &select.selection {
        walk_expr(selection, issues);
    }
    walk_group_by(&select.group_by, issues);
    if let Some(having) = &select.having {
        walk_expr(having, issues);
    }
    if let Some(qualify) = &select.qualify {
        walk_expr(qualify, issues);
    }
}

fn walk_select_item(item: &SelectItem, issues: &mut Vec<ValidationIssue>) {
    match item {
        SelectItem::UnnamedExpr(expr) => walk_expr(expr, issues),
        // alias is an identifier field: skipped
        SelectItem::ExprWithAlias { expr, .. } => walk_expr(expr, issues),
        SelectItem::QualifiedWildcard(..) | SelectItem::Wildcard(..) => {}
    }
}

fn walk_group_by(group_by: &GroupByExpr, issues: &mut Vec<ValidationIssue>) {
    match group_by {
        GroupByExpr::All(..) => {}
        GroupByExpr::Expressions(exprs, ..) => {
            for expr in exprs {
                walk_expr(expr, issues);
            }
        }
    }
}

fn walk_table_with_joins(table_with_joins: &TableWithJoins, issues: &mut Vec<ValidationIssue>) {
    walk_table_factor(&table_with_joins.relation, issues);
    for join in &table_with_joins.joins {
        walk_table_factor(&join.relation, issues);
        match &join.join_operator {
            JoinOperator::Inner(constraint)
            | JoinOperator::Left(constraint)
            | JoinOperator::LeftOuter(constraint)
            | JoinOperator::Right(constraint)
            | JoinOperator::RightOuter(constraint)
            | JoinOperator::FullOuter(constraint)
            | JoinOperator::Semi(constraint)
            | JoinOperator::LeftSemi(constraint)
            | JoinOperator::RightSemi(constraint)
            | JoinOperator::Anti(constraint)
            | JoinOperator::LeftAnti(constraint)
            | JoinOperator::RightAnti(constraint) => {
                if let JoinConstraint::On(expr) = constraint {
                    walk_expr(expr, issues);
                }
            }
            JoinOperator::AsOf {
                match_condition,
                constraint,
            } => {
                walk_expr(match_condition, issues);
                if let JoinConstraint::On(expr) = constraint {
                    walk_expr(expr, issues);
                }
            }
            // CROSS JOIN and APPLY forms carry no constraint expression
            _ => {}
        }
    }
}

fn walk_table_factor(factor: &TableFactor, issues: &mut Vec<ValidationIssue>) {
    match factor {
        // name and alias are identifier fields: skipped
        TableFactor::Table { .. } => {}
        TableFactor::Derived { subquery, .. } => walk_query(subquery, issues),
        TableFactor::Function { args, .. } => {
            for arg in args {
                walk_function_arg(arg, issues);
            }
        }
        TableFactor::UNNEST { array_exprs, .. } => {
            for expr in array_exprs {
                walk_expr(expr, issues);
            }
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => walk_table_with_joins(table_with_joins, issues),
        TableFactor::Pivot { table, .. } | TableFactor::Unpivot { table, .. } => {
            walk_table_factor(table, issues);
        }
        // JSON tables and other exotic factors carry no child statements
        _ => {}
    }
}

fn walk_function_arg(arg: &FunctionArg, issues: &mut Vec<ValidationIssue>) {
    match arg {
        FunctionArg::Unnamed(arg_expr)
        | FunctionArg::Named { arg: arg_expr, .. }
        | FunctionArg::ExprNamed { arg: arg_expr, .. } => {
            if let FunctionArgExpr::Expr(expr) = arg_expr {
                walk_expr(expr, issues);
            }
        }
    }
}

fn walk_expr(expr: &Expr, issues: &mut Vec<ValidationIssue>) {
    match expr {
        Expr::Subquery(query) => walk_query(query, issues),
        // The IN body is a bare set expression, which can hold a write
        Expr::InSubquery { expr, subquery, .. } => {
            walk_expr(expr, issues);
            walk_set_expr(subquery, issues);
        }
        Expr::Exists { subquery, .. } => walk_query(subquery, issues),
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, issues);
            walk_expr(right, issues);
        }
        Expr::UnaryOp { expr, .. } => walk_expr(expr, issues),
        Expr::Cast { expr, .. } => walk_expr(expr, issues),
        Expr::Extract { expr, .. } => walk_expr(expr, issues),
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            walk_expr(expr, issues);
            if let Some(from_expr) = substring_from {
                walk_expr(from_expr, issues);
            }
            if let Some(for_expr) = substring_for {
                walk_expr(for_expr, issues);
            }
        }
        Expr::Nested(expr) => walk_expr(expr, issues),
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(expr) = operand {
                walk_expr(expr, issues);
            }
            for case_when in conditions {
                walk_expr(&case_when.condition, issues);
                walk_expr(&case_when.result, issues);
            }
            if let Some(expr) = else_result {
                walk_expr(expr, issues);
            }
        }
        Expr::Function(func) => match &func.args {
            sqlparser::ast::FunctionArguments::List(arg_list) => {
                for arg in &arg_list.args {
                    walk_function_arg(arg, issues);
                }
            }
            sqlparser::ast::FunctionArguments::Subquery(query) => walk_query(query, issues),
            sqlparser::ast::FunctionArguments::None => {}
        },
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, issues);
            for item in list {
                walk_expr(item, issues);
            }
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr, issues);
            walk_expr(low, issues);
            walk_expr(high, issues);
        }
        Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr)
        | Expr::IsUnknown(expr)
        | Expr::IsNotUnknown(expr) => walk_expr(expr, issues),
        Expr::InUnnest {
            expr, array_expr, ..
        } => {
            walk_expr(expr, issues);
            walk_expr(array_expr, issues);
        }
        Expr::Tuple(exprs) => {
            for expr in exprs {
                walk_expr(expr, issues);
            }
        }
        Expr::Array(array) => {
            for expr in &array.elem {
                walk_expr(expr, issues);
            }
        }
        // Identifier, literal, and typed-value fields: skipped by policy
        Expr::Identifier(..)
        | Expr::CompoundIdentifier(..)
        | Expr::Value(..)
        | Expr::TypedString { .. }
        | Expr::Interval { .. } => {}
        // Remaining expression kinds hold no child statements
        _ => {}
    }
}
