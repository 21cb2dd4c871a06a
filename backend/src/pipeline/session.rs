use crate::error::SessionError;
use crate::pipeline::mapping::{
    auto_map, email_from_row, identity_column, name_from_row, DEFAULT_RECIPIENT_NAME,
    EMAIL_COLUMNS, NAME_COLUMNS,
};
use crate::pipeline::placeholders::extract_placeholders;
use crate::pipeline::render::{build_parameters, render};
use common::model::datasource::TabularDataset;
use common::model::merge::Recipient;
use common::model::place_holder::{FieldMapping, MappingReport};
use common::model::template::Template;
use log::debug;
use serde::Serialize;

/// Rendered preview of one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub row: usize,
    pub subject: String,
    pub from_name: String,
    pub to: String,
    pub html: String,
    /// Placeholders that rendered empty because nothing maps them.
    pub unmapped: Vec<String>,
}

/// Working state of one bulk-send screen: the chosen template, the uploaded
/// recipients and the mapping between them.
///
/// Template and dataset can arrive in any order. Whenever either changes the
/// mapping is rebuilt from scratch and manual assignments are dropped, since
/// they may name placeholders or columns that no longer exist.
#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    template: Option<Template>,
    dataset: Option<TabularDataset>,
    placeholders: Vec<String>,
    mapping: FieldMapping,
}

impl MergeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_template(&mut self, template: Template) {
        self.placeholders = extract_placeholders(&template.content);
        self.template = Some(template);
        self.remap();
    }

    pub fn set_dataset(&mut self, dataset: TabularDataset) {
        self.dataset = Some(dataset);
        self.remap();
    }

    /// Manually points `placeholder` at `column`, overriding the automatic match.
    pub fn assign(&mut self, placeholder: &str, column: &str) -> Result<(), SessionError> {
        if !self.placeholders.iter().any(|p| p == placeholder) {
            return Err(SessionError::UnknownPlaceholder(placeholder.to_string()));
        }
        let dataset = self.dataset.as_ref().ok_or(SessionError::MissingDataset)?;
        if !dataset.has_column(column) {
            return Err(SessionError::UnknownColumn(column.to_string()));
        }

        self.mapping.insert(placeholder.to_string(), column.to_string());
        Ok(())
    }

    /// Applies every entry of `assignments`, stopping at the first invalid one.
    pub fn assign_all(&mut self, assignments: &FieldMapping) -> Result<(), SessionError> {
        for (placeholder, column) in assignments {
            self.assign(placeholder, column)?;
        }
        Ok(())
    }

    /// Placeholders still without a column, in template order.
    pub fn unmapped(&self) -> Vec<String> {
        self.placeholders
            .iter()
            .filter(|p| !self.mapping.contains_key(*p))
            .cloned()
            .collect()
    }

    pub fn report(&self) -> MappingReport {
        let headers = self.headers();
        MappingReport {
            placeholders: self.placeholders.clone(),
            mapping: self.mapping.clone(),
            unmapped: self.unmapped(),
            email_column: identity_column(headers, &EMAIL_COLUMNS),
            name_column: identity_column(headers, &NAME_COLUMNS),
        }
    }

    /// Renders and sanitizes row `row` for display.
    pub fn preview(&self, row: usize) -> Result<Preview, SessionError> {
        let template = self.template.as_ref().ok_or(SessionError::MissingTemplate)?;
        let dataset = self.dataset.as_ref().ok_or(SessionError::MissingDataset)?;
        let values = dataset.rows.get(row).ok_or(SessionError::RowOutOfRange {
            row,
            rows: dataset.len(),
        })?;

        let to = Some(email_from_row(values))
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_RECIPIENT_NAME.to_string());

        Ok(Preview {
            row,
            subject: template.subject.clone(),
            from_name: template.from_name.clone(),
            to,
            html: render(&template.content, values, &self.mapping),
            unmapped: self.unmapped(),
        })
    }

    /// Snapshot of every row as a recipient, ready to hand to a dispatcher.
    ///
    /// Parameters cover every placeholder of the template; unmapped ones are
    /// sent as empty text, matching what the preview shows.
    pub fn recipients(&self) -> Result<Vec<Recipient>, SessionError> {
        self.template.as_ref().ok_or(SessionError::MissingTemplate)?;
        let dataset = self.dataset.as_ref().ok_or(SessionError::MissingDataset)?;

        Ok(dataset
            .rows
            .iter()
            .map(|row| {
                let mut parameters = build_parameters(row, &self.mapping);
                for placeholder in &self.placeholders {
                    parameters.entry(placeholder.clone()).or_default();
                }
                Recipient {
                    email_address: email_from_row(row),
                    name: name_from_row(row),
                    parameters,
                }
            })
            .collect())
    }

    fn headers(&self) -> &[String] {
        self.dataset.as_ref().map(|d| d.headers.as_slice()).unwrap_or(&[])
    }

    fn remap(&mut self) {
        self.mapping = auto_map(&self.placeholders, self.headers());
        debug!(
            "Rebuilt field mapping: {} of {} placeholders mapped",
            self.mapping.len(),
            self.placeholders.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::datasource::Row;
    use serde_json::json;

    fn template(content: &str) -> Template {
        Template {
            id: "tpl-1".into(),
            name: "Welcome".into(),
            subject: "Your code".into(),
            from_name: "Acme".into(),
            reply_to: None,
            cc: None,
            bcc: None,
            to_email: None,
            content: content.into(),
        }
    }

    fn dataset() -> TabularDataset {
        let row: Row = [
            ("Name".to_string(), json!("Ann")),
            ("Code".to_string(), json!("123")),
            ("Email".to_string(), json!("a@x.com")),
        ]
        .into_iter()
        .collect();
        TabularDataset::new(vec!["Name".into(), "Code".into(), "Email".into()], vec![row])
    }

    #[test]
    fn end_to_end_mapping_and_preview() {
        let mut session = MergeSession::new();
        session.set_template(template("Hi {{name}}, your code is {{code}}"));
        session.set_dataset(dataset());

        let report = session.report();
        assert_eq!(report.mapping.get("name").map(String::as_str), Some("Name"));
        assert_eq!(report.mapping.get("code").map(String::as_str), Some("Code"));
        assert_eq!(report.email_column.as_deref(), Some("Email"));
        assert!(report.is_complete());

        let preview = session.preview(0).unwrap();
        assert_eq!(preview.html, "Hi Ann, your code is 123");
        assert_eq!(preview.to, "a@x.com");
        assert_eq!(preview.subject, "Your code");
    }

    #[test]
    fn inputs_can_arrive_in_either_order() {
        let mut first = MergeSession::new();
        first.set_dataset(dataset());
        first.set_template(template("{{code}}"));

        let mut second = MergeSession::new();
        second.set_template(template("{{code}}"));
        second.set_dataset(dataset());

        assert_eq!(first.report().mapping, second.report().mapping);
    }

    #[test]
    fn changing_inputs_discards_manual_assignments() {
        let mut session = MergeSession::new();
        session.set_template(template("{{greeting}}"));
        session.set_dataset(dataset());
        assert_eq!(session.unmapped(), vec!["greeting"]);

        session.assign("greeting", "Name").unwrap();
        assert!(session.unmapped().is_empty());

        session.set_dataset(dataset());
        assert_eq!(session.unmapped(), vec!["greeting"]);
    }

    #[test]
    fn invalid_assignments_leave_state_untouched() {
        let mut session = MergeSession::new();
        session.set_template(template("{{code}}"));
        session.set_dataset(dataset());
        let before = session.report().mapping;

        assert_eq!(
            session.assign("code", "Zip"),
            Err(SessionError::UnknownColumn("Zip".into()))
        );
        assert_eq!(
            session.assign("nope", "Name"),
            Err(SessionError::UnknownPlaceholder("nope".into()))
        );
        assert_eq!(session.report().mapping, before);
    }

    #[test]
    fn recipients_fill_unmapped_placeholders_with_empty_text() {
        let mut session = MergeSession::new();
        session.set_template(template("{{code}} {{coupon}}"));
        session.set_dataset(dataset());

        let recipients = session.recipients().unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email_address, "a@x.com");
        assert_eq!(recipients[0].name, "Ann");
        assert_eq!(recipients[0].parameters["code"], "123");
        assert_eq!(recipients[0].parameters["coupon"], "");
    }

    #[test]
    fn missing_inputs_are_reported() {
        let mut session = MergeSession::new();
        assert_eq!(session.preview(0), Err(SessionError::MissingTemplate));
        session.set_template(template("x"));
        assert_eq!(session.recipients(), Err(SessionError::MissingDataset));
        session.set_dataset(dataset());
        assert_eq!(
            session.preview(3),
            Err(SessionError::RowOutOfRange { row: 3, rows: 1 })
        );
    }
}
