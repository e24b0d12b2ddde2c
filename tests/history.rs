#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset};
    use jira_kpi::libs::business_time::WorkCalendar;
    use jira_kpi::libs::history::{HistoryError, Identities, Reconstructor};
    use jira_kpi::libs::issue::{ChangeEvent, Issue, Person};
    use jira_kpi::libs::vocabulary::StatusVocabulary;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    // 2024-01-15 is a Monday.
    const MON_09: &str = "2024-01-15T09:00:00+00:00";
    const TUE_09: &str = "2024-01-16T09:00:00+00:00";
    const WED_09: &str = "2024-01-17T09:00:00+00:00";

    fn identities() -> Identities {
        Identities::new(vec!["Bob Dev", "Carol Dev"], vec!["Ann Analyst"])
    }

    fn lifecycle_issue() -> Issue {
        Issue::new("10001", "KPI-1", at(MON_09), "Done").with_history(vec![
            ChangeEvent::status("To-Do", "In-Progress", at(TUE_09)),
            ChangeEvent::status("In-Progress", "Done", at(WED_09)),
        ])
    }

    #[test]
    fn test_zero_history_credits_whole_age_to_current_status() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let other = lifecycle_issue();
        let fresh = Issue::new("10002", "KPI-2", at(MON_09), "To-Do");
        let batch = vec![other, fresh.clone()];
        let vocabulary = StatusVocabulary::discover(&batch);
        let now = at(WED_09);

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, now).reconstruct(&fresh).unwrap();

        assert_eq!(history.duration_of("To-Do"), calendar.elapsed(&fresh.created, &now).unwrap());
        assert_eq!(history.duration_of("In-Progress"), Duration::zero());
        assert_eq!(history.duration_of("Done"), Duration::zero());
        assert_eq!(history.transition_count, 0);
        assert_eq!(history.last_transition, None);
    }

    #[test]
    fn test_end_to_end_lifecycle() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let issue = lifecycle_issue();
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&issue).unwrap();

        // Half-open 08:00-18:00 window: Mon 09-18 plus Tue 08-09.
        assert_eq!(history.duration_of("To-Do"), Duration::hours(10));
        assert_eq!(history.duration_of("In-Progress"), Duration::hours(10));
        assert_eq!(history.duration_of("Done"), Duration::zero());
        assert_eq!(history.transition_count, 2);
        assert_eq!(history.last_transition, Some(at(WED_09)));
        assert_eq!(history.exit_weeks["To-Do"], 3);
        assert_eq!(history.exit_weeks["Done"], 3);
    }

    #[test]
    fn test_conservation_of_business_time() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let issue = Issue::new("10003", "KPI-3", at("2024-01-12T15:20:00+00:00"), "In-Review").with_history(vec![
            ChangeEvent::status("To-Do", "In-Progress", at("2024-01-15T11:05:00+00:00")),
            ChangeEvent::assignee(None, Some("Bob Dev"), at("2024-01-15T11:06:00+00:00")),
            ChangeEvent::status("In-Progress", "In-Review", at("2024-01-18T17:45:00+00:00")),
        ]);
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));
        let now = at("2024-01-23T10:30:00+00:00");

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, now).reconstruct(&issue).unwrap();

        assert_eq!(history.total(), calendar.elapsed(&issue.created, &now).unwrap());
    }

    #[test]
    fn test_reentered_status_accumulates() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let created = at(MON_09);
        let left = at("2024-01-15T12:00:00+00:00");
        let back = at("2024-01-16T10:00:00+00:00");
        let now = at("2024-01-17T10:00:00+00:00");
        let issue = Issue::new("10004", "KPI-4", created, "Open").with_history(vec![
            ChangeEvent::status("Open", "Blocked", left),
            ChangeEvent::status("Blocked", "Open", back),
        ]);
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, now).reconstruct(&issue).unwrap();

        let first_visit = calendar.elapsed(&created, &left).unwrap();
        let second_visit = calendar.elapsed(&back, &now).unwrap();
        assert_eq!(history.duration_of("Open"), first_visit + second_visit);
        assert_eq!(history.duration_of("Open"), Duration::hours(13));
        assert_eq!(history.duration_of("Blocked"), Duration::hours(8));
        assert_eq!(history.total(), calendar.elapsed(&created, &now).unwrap());
    }

    #[test]
    fn test_batch_vocabulary_gives_uniform_columns() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let a = Issue::new("1", "KPI-10", at(MON_09), "Done").with_history(vec![ChangeEvent::status("To-Do", "Done", at(TUE_09))]);
        let b = Issue::new("2", "KPI-11", at(MON_09), "Done").with_history(vec![
            ChangeEvent::status("To-Do", "In-Review", at(TUE_09)),
            ChangeEvent::status("In-Review", "Done", at(WED_09)),
        ]);
        let batch = vec![a, b];
        let vocabulary = StatusVocabulary::discover(&batch);
        let reconstructor = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09));

        let ha = reconstructor.reconstruct(&batch[0]).unwrap();
        let hb = reconstructor.reconstruct(&batch[1]).unwrap();

        assert_eq!(vocabulary.len(), 3);
        assert!(ha.durations.keys().eq(hb.durations.keys()));
        assert!(ha.exit_weeks.keys().eq(hb.exit_weeks.keys()));
        assert_eq!(ha.duration_of("In-Review"), Duration::zero());
        assert_eq!(ha.exit_weeks["In-Review"], 0);
        assert_eq!(hb.duration_of("In-Review"), Duration::hours(10));
    }

    #[test]
    fn test_out_of_order_history_is_a_data_integrity_error() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let issue = Issue::new("10005", "KPI-5", at(MON_09), "Done").with_history(vec![
            ChangeEvent::status("To-Do", "In-Progress", at(WED_09)),
            ChangeEvent::status("In-Progress", "Done", at(TUE_09)),
        ]);
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let err = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&issue).unwrap_err();

        match err {
            HistoryError::DataIntegrity { key, status, .. } => {
                assert_eq!(key, "KPI-5");
                assert_eq!(status, "In-Progress");
            }
        }
    }

    #[test]
    fn test_event_after_report_instant_is_rejected() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let issue = lifecycle_issue();
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let result = Reconstructor::new(&vocabulary, &calendar, &ids, at(TUE_09)).reconstruct(&issue);

        assert!(matches!(result, Err(HistoryError::DataIntegrity { .. })));
    }

    #[test]
    fn test_first_assignee_wins() {
        let calendar = WorkCalendar::default();
        let ids = identities();
        let issue = Issue::new("10006", "KPI-6", at(MON_09), "To-Do")
            .with_history(vec![
                ChangeEvent::assignee(None, Some("Ann Analyst"), at("2024-01-15T09:30:00+00:00")),
                ChangeEvent::assignee(Some("Ann Analyst"), Some("Someone Else"), at("2024-01-15T10:00:00+00:00")),
                ChangeEvent::assignee(Some("Someone Else"), Some("Bob Dev"), at("2024-01-15T11:00:00+00:00")),
                ChangeEvent::assignee(Some("Bob Dev"), Some("Carol Dev"), at("2024-01-16T11:00:00+00:00")),
            ])
            .with_assignee(Person::new("carol", "Carol Dev"));
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&issue).unwrap();

        let developer = history.developer.unwrap();
        assert_eq!(developer.name, "Bob Dev");
        assert_eq!(developer.assigned_at, at("2024-01-15T11:00:00+00:00"));
        assert_eq!(history.bsa.unwrap().name, "Ann Analyst");
        assert_eq!(history.transition_count, 0);
    }

    #[test]
    fn test_assignee_of_record_fallback() {
        let calendar = WorkCalendar::default();
        let ids = identities();
        let issue = Issue::new("10007", "KPI-7", at(MON_09), "To-Do").with_assignee(Person::new("carol", "Carol Dev"));
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&issue).unwrap();

        let developer = history.developer.unwrap();
        assert_eq!(developer.name, "Carol Dev");
        assert_eq!(developer.assigned_at, at(MON_09));
        assert!(history.bsa.is_none());
    }

    #[test]
    fn test_unrecognized_assignee_is_ignored() {
        let calendar = WorkCalendar::default();
        let ids = identities();
        let issue = Issue::new("10008", "KPI-8", at(MON_09), "To-Do")
            .with_history(vec![ChangeEvent::assignee(None, Some("Stranger"), at(TUE_09))])
            .with_assignee(Person::new("stranger", "Stranger"));
        let vocabulary = StatusVocabulary::discover(std::slice::from_ref(&issue));

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&issue).unwrap();

        assert!(history.developer.is_none());
        assert!(history.bsa.is_none());
    }

    #[test]
    fn test_blank_status_names_keep_columns_uniform() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let blank = Issue::new("1", "KPI-20", at(MON_09), "Open").with_history(vec![ChangeEvent::status("", "Open", at(TUE_09))]);
        let spaces = Issue::new("2", "KPI-21", at(MON_09), "Open").with_history(vec![ChangeEvent::status("  ", "Open", at(TUE_09))]);
        let plain = Issue::new("3", "KPI-22", at(MON_09), "To-Do");
        let batch = vec![blank, spaces, plain];
        let vocabulary = StatusVocabulary::discover(&batch);
        let reconstructor = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09));

        let histories: Vec<_> = batch.iter().map(|issue| reconstructor.reconstruct(issue).unwrap()).collect();

        assert_eq!(vocabulary.iter().collect::<Vec<_>>(), vec!["Open", "To-Do"]);
        for history in &histories {
            assert!(history.durations.keys().eq(histories[2].durations.keys()));
            assert!(history.exit_weeks.keys().eq(histories[2].exit_weeks.keys()));
        }
        assert_eq!(histories[0].duration_of("Open"), Duration::hours(10));
        assert_eq!(histories[0].transition_count, 1);
        assert_eq!(histories[1].duration_of("Open"), Duration::hours(10));
    }

    #[test]
    fn test_blank_current_status_adds_no_column() {
        let calendar = WorkCalendar::default();
        let ids = Identities::default();
        let blank = Issue::new("1", "KPI-23", at(MON_09), "").with_history(vec![ChangeEvent::status("To-Do", "", at(TUE_09))]);
        let batch = vec![blank];
        let vocabulary = StatusVocabulary::discover(&batch);

        let history = Reconstructor::new(&vocabulary, &calendar, &ids, at(WED_09)).reconstruct(&batch[0]).unwrap();

        assert_eq!(history.durations.keys().collect::<Vec<_>>(), vec!["To-Do"]);
        assert_eq!(history.duration_of("To-Do"), Duration::hours(10));
    }
}
