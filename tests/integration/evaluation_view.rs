use super::support::{fs_service, summarize, tar_of, text};
use std::io::Cursor;
use taskfs::archive::decode_all;
use taskfs::error::ApiError;
use tempfile::TempDir;
use uuid::Uuid;

fn initial_upload() -> Vec<u8> {
    tar_of(&[
        ("README.md", "Implement add()"),
        ("src/calc.py", "def add(a, b):\n    pass\n"),
        ("tests/test_calc.py", "assert add(1, 2) == 3"),
        ("tests/secret/grader.py", "grade()"),
    ])
}

#[test]
fn test_student_edits_hidden_and_protected_files() {
    let temp = TempDir::new().unwrap();
    let service = fs_service(&temp);
    let teacher = "teacher".to_string();

    let mut task = service
        .create_task_files(Uuid::new_v4(), teacher.clone(), &mut Cursor::new(initial_upload()))
        .unwrap();
    service
        .configure_patterns(&mut task, &teacher, ["tests/secret/**"], ["tests/*.py"])
        .unwrap();
    let answer = service
        .create_answer_files(&task, Uuid::new_v4(), "student")
        .unwrap();

    // the student rewrites the solution, tampers with a test and drops the grader
    let submitted = tar_of(&[
        ("README.md", "Implement add()"),
        ("src/calc.py", "def add(a, b):\n    return a + b\n"),
        ("tests/test_calc.py", "assert True"),
        ("notes.txt", "done"),
    ]);
    service
        .write_archive(&answer.current_files, &mut Cursor::new(submitted))
        .unwrap();

    let view = service.effective_view(&task, &answer).unwrap();
    assert_eq!(
        summarize(&view),
        vec![
            ("README.md".to_string(), Some("Implement add()".to_string())),
            (
                "src/calc.py".to_string(),
                Some("def add(a, b):\n    return a + b\n".to_string())
            ),
            (
                "tests/test_calc.py".to_string(),
                Some("assert add(1, 2) == 3".to_string())
            ),
            ("notes.txt".to_string(), Some("done".to_string())),
        ]
    );

    // the exported archive carries exactly the view
    let exported = service
        .export_effective_view(&task, &answer, Vec::new())
        .unwrap();
    let decoded = decode_all(Cursor::new(exported)).unwrap();
    assert_eq!(summarize(&decoded), summarize(&view));

    // the stored answer itself is untouched
    let stored = service
        .get_file(&answer.current_files, "tests/test_calc.py")
        .unwrap()
        .unwrap();
    assert_eq!(text(&stored), "assert True");
}

#[test]
fn test_deleted_protected_file_is_restored() {
    let temp = TempDir::new().unwrap();
    let service = fs_service(&temp);
    let teacher = "teacher".to_string();

    let mut task = service
        .create_task_files(Uuid::new_v4(), teacher.clone(), &mut Cursor::new(initial_upload()))
        .unwrap();
    let no_patterns: [&str; 0] = [];
    service
        .configure_patterns(&mut task, &teacher, no_patterns, ["tests/**"])
        .unwrap();
    let answer = service
        .create_answer_files(&task, Uuid::new_v4(), "student")
        .unwrap();
    service
        .write_archive(
            &answer.current_files,
            &mut Cursor::new(tar_of(&[("src/calc.py", "solution")])),
        )
        .unwrap();

    let paths: Vec<String> = service
        .effective_view(&task, &answer)
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect();
    assert_eq!(
        paths,
        vec!["src/calc.py", "tests/test_calc.py", "tests/secret/grader.py"]
    );
}

#[test]
fn test_reset_restores_initial_bytes() {
    let temp = TempDir::new().unwrap();
    let service = fs_service(&temp);

    let task = service
        .create_task_files(Uuid::new_v4(), "teacher", &mut Cursor::new(initial_upload()))
        .unwrap();
    let answer = service
        .create_answer_files(&task, Uuid::new_v4(), "student")
        .unwrap();
    service
        .write_archive(
            &answer.current_files,
            &mut Cursor::new(tar_of(&[("scratch.txt", "x")])),
        )
        .unwrap();
    assert_ne!(
        service.store().digest(&answer.current_files).unwrap(),
        service.store().digest(&task.initial_files).unwrap()
    );

    service.reset_answer(&task, &answer).unwrap();
    assert_eq!(
        service.store().digest(&answer.current_files).unwrap(),
        service.store().digest(&task.initial_files).unwrap()
    );
}

#[test]
fn test_students_cannot_read_or_change_rules() {
    let temp = TempDir::new().unwrap();
    let service = fs_service(&temp);
    let mut task = service
        .create_task_files(Uuid::new_v4(), "teacher", &mut Cursor::new(initial_upload()))
        .unwrap();
    let student = "student".to_string();

    assert!(service.file_policy_for(&task, &student).is_none());
    let err = service
        .configure_patterns(&mut task, &student, ["**"], ["**"])
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));
    assert!(task.hidden_files.is_empty());

    let patterns = service
        .file_policy_for(&task, &"teacher".to_string())
        .unwrap();
    assert!(patterns.protected_files.is_empty());
}
