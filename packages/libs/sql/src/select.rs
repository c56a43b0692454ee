//! 목록/단건/카운트 SELECT 빌더
//!
//! JOIN 결과를 `json_agg(json_build_array(...))`로 접어 올리고, 베이스 테이블 primary key로
//! GROUP BY 합니다. LIMIT/OFFSET은 리터럴로, 나머지 값은 모두 `$N` placeholder로 출력합니다.
//!
//! 모든 식별자는 인용되므로 예약어나 대소문자가 섞인 이름도 그대로 쓸 수 있습니다.

use sea_query::Value as SqlValue;
use serde_json::Value;

use reqgen_core::schema::{resolve_alias, FieldType, FilterMap, JoinSpec, TableDescriptor};

use crate::params::SelectParams;
use crate::statement::{bind_value, qualified_column, qualified_table, quote_ident, Statement};

/// 베이스 테이블 별칭
pub const BASE_ALIAS: &str = "base";

/// SELECT 쿼리 빌더
pub struct SelectBuilder<'a> {
    table: &'a TableDescriptor,
    schema: &'a str,
}

impl<'a> SelectBuilder<'a> {
    /// 새 빌더 생성
    pub fn new(table: &'a TableDescriptor, schema: &'a str) -> Self {
        Self { table, schema }
    }

    /// 행 조회 SQL
    pub fn build(&self, params: &SelectParams) -> Statement {
        self.render(params, false)
    }

    /// 카운트 SQL (필터는 같고 LIMIT/OFFSET 없음)
    pub fn build_count(&self, params: &SelectParams) -> Statement {
        self.render(params, true)
    }

    fn render(&self, params: &SelectParams, is_count: bool) -> Statement {
        let mut binder = Binder::default();
        let pk = qualified_column(BASE_ALIAS, &self.table.primary_key);

        let projection = if is_count {
            "COUNT(*)".to_string()
        } else {
            self.projection(params).join(", ")
        };

        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            projection,
            qualified_table(self.schema, &self.table.name),
            quote_ident(BASE_ALIAS)
        );

        for (position, join) in params.joins.iter().enumerate() {
            if join.table.is_empty() {
                continue;
            }
            let alias = JoinSpec::alias(position);
            sql.push_str(&format!(
                " {} JOIN {} AS {} ON {} = {}",
                join.kind,
                qualified_table(self.schema, &join.table),
                quote_ident(&alias),
                qualified_column(BASE_ALIAS, &join.parent_key),
                qualified_column(&alias, &join.target_key)
            ));
        }

        let conditions = self.conditions(params, &mut binder);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(&format!(" GROUP BY {pk}"));

        if !is_count {
            sql.push_str(&format!(
                " ORDER BY {} LIMIT {} OFFSET {}",
                pk,
                params.size,
                params.size.saturating_mul(params.page)
            ));
        }

        tracing::debug!(
            "built {} for '{}': {} ({} params)",
            if is_count { "count" } else { "select" },
            self.table.name,
            sql,
            binder.values.len()
        );

        Statement::new(sql, binder.values)
    }

    /// primary key, 필드(정의 순서, select 함수 적용), JOIN 집계 순
    fn projection(&self, params: &SelectParams) -> Vec<String> {
        let mut columns = vec![qualified_column(BASE_ALIAS, &self.table.primary_key)];

        for field in self.table.fields_for(&params.fields) {
            let column = qualified_column(BASE_ALIAS, &field.name);
            match &field.select_function {
                Some(function) => columns.push(format!("{function}({column})")),
                None => columns.push(column),
            }
        }

        for (position, join) in params.joins.iter().enumerate() {
            if !join.is_projected() {
                continue;
            }
            let alias = JoinSpec::alias(position);
            let items: Vec<String> = join
                .fields
                .iter()
                .map(|f| qualified_column(&alias, f))
                .collect();
            columns.push(format!(
                "json_agg(json_build_array({})) AS {}",
                items.join(", "),
                quote_ident(&join.result_key)
            ));
        }

        columns
    }

    /// WHERE 단계: 조회 키, WHERE 절, 검색, 필터 (각 단계는 괄호로 묶여 AND로 연결)
    fn conditions(&self, params: &SelectParams, binder: &mut Binder) -> Vec<String> {
        let mut conditions = Vec::new();

        if let Some(lookup) = &params.lookup {
            conditions.push(self.base_equality(&lookup.column, &lookup.value, binder));
        }

        if let Some(clause) = params.r#where.as_ref().filter(|c| c.is_usable()) {
            let mut parts = Vec::new();
            for (name, value, connector) in clause.predicates() {
                let mut part = self.base_equality(name, value, binder);
                if let Some(connector) = connector {
                    part.push_str(&format!(" {connector}"));
                }
                parts.push(part);
            }
            conditions.push(format!("({})", parts.join(" ")));
        }

        if let Some(term) = params.search.as_deref().filter(|t| !t.is_empty()) {
            if !params.search_fields.is_empty() {
                let placeholder = binder.bind(escape_like(&term.to_lowercase()).into());
                let parts: Vec<String> = params
                    .search_fields
                    .iter()
                    .map(|f| {
                        format!(
                            "LOWER({}::text) LIKE '%' || {} || '%' ESCAPE '\\'",
                            qualified_column(BASE_ALIAS, f),
                            placeholder
                        )
                    })
                    .collect();
                conditions.push(format!("({})", parts.join(" OR ")));
            }
        }

        if !params.filter.is_empty() {
            let parts: Vec<String> = params
                .filter
                .iter()
                .map(|(key, raw)| self.filter_condition(key, raw, &params.joins, binder))
                .collect();
            conditions.push(format!("({})", parts.join(" AND ")));
        }

        conditions
    }

    /// 필터 하나
    ///
    /// 선언 타입으로 변환되는 값은 타입 그대로 바인딩하고, 문자열 값(dotted 키 포함)은 text로 비교합니다.
    fn filter_condition(&self, key: &str, raw: &str, joins: &[JoinSpec], binder: &mut Binder) -> String {
        if let Some((prefix, column)) = FilterMap::split_dotted(key) {
            let target = qualified_column(&resolve_alias(prefix, joins), column);
            return equality(&target, &Value::String(raw.to_string()), None, binder);
        }

        let field_type = self.table.column_type(key);
        let value = field_type
            .and_then(|t| t.coerce(raw))
            .unwrap_or_else(|| Value::String(raw.to_string()));
        equality(&qualified_column(BASE_ALIAS, key), &value, field_type, binder)
    }

    /// 베이스 테이블 컬럼 equality (값은 컬럼 선언 타입으로 변환)
    fn base_equality(&self, column: &str, value: &Value, binder: &mut Binder) -> String {
        let value = self.table.coerce_key(column, value);
        equality(
            &qualified_column(BASE_ALIAS, column),
            &value,
            self.table.column_type(column),
            binder,
        )
    }
}

/// `column = $n`
///
/// 문자열 값은 text 파라미터로 바인딩되므로 컬럼도 text로 비교합니다 (uuid, date, enum 컬럼 대응).
fn equality(column: &str, value: &Value, field_type: Option<FieldType>, binder: &mut Binder) -> String {
    let placeholder = binder.bind(bind_value(value, field_type));
    if value.is_string() {
        format!("{column}::text = {placeholder}")
    } else {
        format!("{column} = {placeholder}")
    }
}

/// LIKE 패턴 이스케이프 (`\`, `%`, `_`)
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// placeholder 번호 부여 + 값 수집
#[derive(Default)]
struct Binder {
    values: Vec<SqlValue>,
}

impl Binder {
    fn bind(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Pagination;
    use reqgen_core::schema::{FieldDescriptor, FieldType, JoinKind, WhereClause};
    use serde_json::{json, Value};

    fn param(value: &Value) -> SqlValue {
        bind_value(value, None)
    }

    fn table() -> TableDescriptor {
        TableDescriptor::new("items", "id")
            .field(FieldDescriptor::new("f1", FieldType::String))
            .field(FieldDescriptor::new("f2", FieldType::Int))
            .field(FieldDescriptor::new("f3", FieldType::String).select_function("upper"))
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_basic_select() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1", "f2"])).page(Pagination { page: 0, size: 10 });
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert_eq!(
            stmt.sql,
            "SELECT \"base\".\"id\", \"base\".\"f1\", \"base\".\"f2\" FROM \"public\".\"items\" AS \"base\" \
             GROUP BY \"base\".\"id\" ORDER BY \"base\".\"id\" LIMIT 10 OFFSET 0"
        );
        assert!(!stmt.sql.contains("WHERE"));
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_fields_follow_descriptor_order_and_select_function() {
        let table = table();
        let params = SelectParams::new(&fields(&["f3", "f1"])).page(Pagination { page: 2, size: 5 });
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt
            .sql
            .starts_with("SELECT \"base\".\"id\", \"base\".\"f1\", upper(\"base\".\"f3\") FROM"));
        assert!(stmt.sql.ends_with("LIMIT 5 OFFSET 10"));
    }

    #[test]
    fn test_where_clause_with_connectors() {
        let table = table();
        let clause = WhereClause::empty().and("f1", 1).and("f2", 2);
        let params = SelectParams::new(&fields(&["f1"]))
            .with_where(Some(clause))
            .page(Pagination { page: 0, size: 10 });
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt
            .sql
            .contains("WHERE (\"base\".\"f1\" = $1 AND \"base\".\"f2\" = $2) GROUP BY"));
        assert_eq!(stmt.params(), &[param(&json!(1)), param(&json!(2))]);
    }

    #[test]
    fn test_where_clause_with_length_mismatch_is_ignored() {
        let table = table();
        let mut clause = WhereClause::empty().or("f1", "a").and("f2", 2);
        clause.values.pop();
        let params = SelectParams::new(&fields(&["f1"])).with_where(Some(clause));
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(!stmt.sql.contains("WHERE"));
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_search_uses_single_lowercased_param() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1"]))
            .search(Some("Foo".to_string()), &fields(&["f1", "f3"]))
            .page(Pagination { page: 0, size: 10 });
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt.sql.contains(
            "WHERE (LOWER(\"base\".\"f1\"::text) LIKE '%' || $1 || '%' ESCAPE '\\' OR LOWER(\"base\".\"f3\"::text) LIKE '%' || $1 || '%' ESCAPE '\\')"
        ));
        assert_eq!(stmt.params(), &[param(&json!("foo"))]);
    }

    #[test]
    fn test_empty_search_is_skipped() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1"])).search(Some(String::new()), &fields(&["f1"]));
        let stmt = SelectBuilder::new(&table, "public").build(&params);
        assert!(!stmt.sql.contains("LIKE"));
    }

    #[test]
    fn test_filters_keep_insertion_order_and_resolve_join_alias() {
        let table = table();
        let join = JoinSpec::new("tags", JoinKind::Left, "id", "item_id", &["y"], "j");
        let filter = FilterMap::new().with("f1", "x").with("j.y", "z");
        let params = SelectParams::new(&fields(&["f1"]))
            .joins(&[join])
            .filter(filter)
            .page(Pagination { page: 0, size: 10 });
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt
            .sql
            .contains("WHERE (\"base\".\"f1\"::text = $1 AND \"j0\".\"y\"::text = $2)"));
        assert_eq!(stmt.params(), &[param(&json!("x")), param(&json!("z"))]);
    }

    #[test]
    fn test_filter_values_bound_by_declared_type() {
        let table = table();
        let filter = FilterMap::new().with("f2", "7").with("other.col", "1");
        let params = SelectParams::new(&fields(&["f1"])).filter(filter);
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt
            .sql
            .contains("(\"base\".\"f2\" = $1 AND \"other\".\"col\"::text = $2)"));
        assert_eq!(stmt.params(), &[param(&json!(7)), param(&json!("1"))]);

        let filter = FilterMap::new().with("f2", "seven");
        let params = SelectParams::new(&fields(&["f1"])).filter(filter);
        let stmt = SelectBuilder::new(&table, "public").build(&params);
        assert!(stmt.sql.contains("(\"base\".\"f2\"::text = $1)"));
    }

    #[test]
    fn test_stage_order_and_numbering() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1"]))
            .lookup("id", json!("9"))
            .with_where(Some(WhereClause::empty().and("f2", 3)))
            .search(Some("q".to_string()), &fields(&["f1"]))
            .filter(FilterMap::new().with("f1", "v"));
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt.sql.contains(
            "WHERE \"base\".\"id\" = $1 AND (\"base\".\"f2\" = $2) AND (LOWER(\"base\".\"f1\"::text) LIKE '%' || $3 || '%' ESCAPE '\\') AND (\"base\".\"f1\"::text = $4)"
        ));
        assert_eq!(
            stmt.params(),
            &[param(&json!(9)), param(&json!(3)), param(&json!("q")), param(&json!("v"))]
        );
    }

    #[test]
    fn test_search_term_wildcards_are_escaped() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1"]))
            .search(Some("50%_Off\\".to_string()), &fields(&["f1"]));
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt.sql.contains("LIKE '%' || $1 || '%' ESCAPE '\\'"));
        assert_eq!(stmt.params(), &[param(&json!("50\\%\\_off\\\\"))]);
    }

    #[test]
    fn test_string_values_compare_as_text() {
        let table = TableDescriptor::new("sessions", "token")
            .primary_key_type(FieldType::String)
            .field(FieldDescriptor::new("started_on", FieldType::String))
            .field(FieldDescriptor::new("hits", FieldType::Int));
        let clause = WhereClause::empty().and("started_on", "2024-01-01").and("hits", "3");
        let params = SelectParams::new(&fields(&["hits"]))
            .lookup("token", json!("5f0c1a2e-8d7b-4c1e-9a55-0d3f4b2c7e91"))
            .with_where(Some(clause));
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt.sql.contains(
            "WHERE \"base\".\"token\"::text = $1 AND (\"base\".\"started_on\"::text = $2 AND \"base\".\"hits\" = $3)"
        ));
        assert_eq!(
            stmt.params(),
            &[
                param(&json!("5f0c1a2e-8d7b-4c1e-9a55-0d3f4b2c7e91")),
                param(&json!("2024-01-01")),
                param(&json!(3))
            ]
        );
    }

    #[test]
    fn test_joins_projection_and_from() {
        let table = table();
        let joins = vec![
            JoinSpec::new("tags", JoinKind::Inner, "id", "item_id", &["name", "weight"], "tags"),
            JoinSpec::new("owners", JoinKind::LeftOuter, "owner_id", "id", &[], "owner"),
            JoinSpec::new("tags", JoinKind::Right, "id", "parent_id", &["name"], "child_tags"),
        ];
        let params = SelectParams::new(&fields(&["f1"])).joins(&joins);
        let stmt = SelectBuilder::new(&table, "public").build(&params);

        assert!(stmt.sql.contains(
            "json_agg(json_build_array(\"j0\".\"name\", \"j0\".\"weight\")) AS \"tags\", json_agg(json_build_array(\"j2\".\"name\")) AS \"child_tags\" FROM"
        ));
        assert!(stmt.sql.contains(
            " INNER JOIN \"public\".\"tags\" AS \"j0\" ON \"base\".\"id\" = \"j0\".\"item_id\""
        ));
        assert!(stmt.sql.contains(
            " LEFT OUTER JOIN \"public\".\"owners\" AS \"j1\" ON \"base\".\"owner_id\" = \"j1\".\"id\""
        ));
        assert!(stmt.sql.contains(
            " RIGHT JOIN \"public\".\"tags\" AS \"j2\" ON \"base\".\"id\" = \"j2\".\"parent_id\""
        ));
    }

    #[test]
    fn test_join_without_table_is_not_joined() {
        let table = table();
        let joins = vec![JoinSpec::new("", JoinKind::Left, "id", "x", &[], "ghost")];
        let params = SelectParams::new(&fields(&["f1"])).joins(&joins);
        let stmt = SelectBuilder::new(&table, "public").build(&params);
        assert!(!stmt.sql.contains("JOIN"));
    }

    #[test]
    fn test_count_variant() {
        let table = table();
        let params = SelectParams::new(&fields(&["f1"]))
            .filter(FilterMap::new().with("f1", "x"))
            .page(Pagination { page: 3, size: 10 });
        let stmt = SelectBuilder::new(&table, "public").build_count(&params);

        assert!(stmt.sql.starts_with("SELECT COUNT(*) FROM \"public\".\"items\" AS \"base\""));
        assert!(stmt.sql.ends_with("GROUP BY \"base\".\"id\""));
        assert!(!stmt.sql.contains("LIMIT"));
        assert_eq!(stmt.params(), &[param(&json!("x"))]);
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let table = TableDescriptor::new("order", "select")
            .field(FieldDescriptor::new("group\"x", FieldType::String));
        let params = SelectParams::new(&fields(&["group\"x"]));
        let stmt = SelectBuilder::new(&table, "my schema").build(&params);

        assert!(stmt.sql.contains("\"base\".\"group\"\"x\""));
        assert!(stmt.sql.contains("FROM \"my schema\".\"order\" AS \"base\""));
        assert!(stmt.sql.contains("GROUP BY \"base\".\"select\""));
    }
}
