mod common;

#[cfg(unix)]
mod session_expect {
    use crate::common::{python, raw_program, sh, STEP_TIMEOUT};
    use ptyscript::{strip_ansi, PtyError};
    use std::error::Error;
    use std::time::{Duration, Instant};

    /// `asdf-test\r` as hex.
    const ASDF_TEST_CR_HEX: &str = "617364662d746573740d";

    #[test]
    fn expect_and_send_answers_prompt_with_carriage_return() -> Result<(), Box<dyn Error>> {
        let program = raw_program(
            r#"
os.write(1, b'? Role prefix: ')
data = read_until(b'\r')
restore()
os.write(1, ('HEX:' + data.hex() + ':END').encode())
"#,
        );
        let mut session = python(&program)?;

        let seen = session.expect_and_send("Role prefix", "asdf-test", Duration::from_secs(30))?;
        assert!(seen.ends_with("Role prefix"));

        let report = session.expect_prompt(":END", STEP_TIMEOUT)?;
        assert!(
            report.contains(&format!("HEX:{ASDF_TEST_CR_HEX}:END")),
            "{}",
            session.dump_output()
        );
        session.close();
        Ok(())
    }

    #[test]
    fn send_line_never_sends_line_feed() -> Result<(), Box<dyn Error>> {
        let program = raw_program(
            r#"
os.write(1, b'ready> ')
data = read_until(b'\r', quiet=0.5)
data += read_until(b'\x00', quiet=0.3)
restore()
os.write(1, ('HEX:' + data.hex() + ':END').encode())
"#,
        );
        let mut session = python(&program)?;
        session.expect_prompt("ready>", STEP_TIMEOUT)?;
        session.send_line("x")?;

        let report = session.expect_prompt(":END", STEP_TIMEOUT)?;
        assert!(report.contains("HEX:780d:END"), "{}", session.dump_output());
        Ok(())
    }

    #[test]
    fn silent_program_times_out_with_nothing_collected() -> Result<(), Box<dyn Error>> {
        let mut session = sh("sleep 5")?;
        let timeout = Duration::from_millis(50);
        let started = Instant::now();

        let err = session.expect_prompt("anything", timeout).unwrap_err();
        let elapsed = started.elapsed();

        match err {
            PtyError::PromptTimeout {
                expected,
                collected,
                ..
            } => {
                assert_eq!(expected, "anything");
                assert!(collected.is_empty(), "collected: {collected:?}");
            }
            other => panic!("expected PromptTimeout, got {other:?}"),
        }
        assert!(elapsed >= timeout, "returned early after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "returned late after {elapsed:?}");
        session.close();
        Ok(())
    }

    #[test]
    fn timeout_error_carries_partial_output() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf 'Welcome'; sleep 5")?;
        let err = session
            .expect_prompt("Role prefix", Duration::from_millis(500))
            .unwrap_err();
        assert!(matches!(err, PtyError::PromptTimeout { .. }));
        assert_eq!(err.collected(), Some("Welcome"));
        assert!(err.to_string().contains("got: Welcome"));
        Ok(())
    }

    #[test]
    fn empty_expectation_matches_first_chunk() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf 'ready'; sleep 5")?;
        let first = session.expect_prompt("", STEP_TIMEOUT)?;
        assert!(!first.is_empty());
        assert!("ready".starts_with(first.as_str()), "{first:?}");
        Ok(())
    }

    #[test]
    fn empty_expectation_with_zero_wait_succeeds_immediately() -> Result<(), Box<dyn Error>> {
        let mut session = sh("sleep 5")?;
        let started = Instant::now();
        let collected = session.expect_prompt("", Duration::ZERO)?;
        assert!(collected.is_empty());
        assert!(started.elapsed() < Duration::from_millis(50));
        Ok(())
    }

    #[test]
    fn output_past_a_match_is_kept_for_the_next_expectation() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf 'first> second> '; sleep 5")?;
        let first = session.expect_prompt("first>", STEP_TIMEOUT)?;
        assert!(first.ends_with("first>"));
        assert!(!first.contains("second>"));

        let second = session.expect_prompt("second>", STEP_TIMEOUT)?;
        assert!(second.ends_with("second>"));
        Ok(())
    }

    #[test]
    fn ended_output_times_out_without_waiting_out_the_deadline() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf 'bye'")?;
        let started = Instant::now();
        let err = session
            .expect_prompt("never printed", Duration::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, PtyError::PromptTimeout { .. }), "{err:?}");
        assert!(err.collected().unwrap_or_default().contains("bye"));
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn read_all_returns_once_output_goes_quiet() -> Result<(), Box<dyn Error>> {
        let mut session = sh("head -c 500 /dev/zero | tr '\\0' x; sleep 5")?;
        let started = Instant::now();

        let output = session.read_all(Duration::from_secs(2));
        let elapsed = started.elapsed();

        assert_eq!(output.matches('x').count(), 500);
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1500), "{elapsed:?}");
        session.close();
        Ok(())
    }

    #[test]
    fn read_all_gives_up_at_the_overall_timeout() -> Result<(), Box<dyn Error>> {
        let mut session = sh("while true; do printf .; sleep 0.05; done")?;
        let started = Instant::now();
        let output = session.read_all(Duration::from_millis(700));
        let elapsed = started.elapsed();

        assert!(output.contains('.'));
        assert!(elapsed >= Duration::from_millis(700), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
        session.close();
        Ok(())
    }

    #[test]
    fn full_output_only_grows() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf 'one '; sleep 0.2; printf 'two'; sleep 5")?;
        session.expect_prompt("one", STEP_TIMEOUT)?;
        let earlier = session.full_output();
        session.expect_prompt("two", STEP_TIMEOUT)?;
        let later = session.full_output();
        assert!(later.starts_with(&earlier));
        assert!(later.contains("one two"));
        Ok(())
    }

    #[test]
    fn clean_output_is_stripped_full_output() -> Result<(), Box<dyn Error>> {
        let session = sh("printf '\\033[1;32mgreen\\033[0m plain'")?;
        session.wait(STEP_TIMEOUT)?;
        std::thread::sleep(Duration::from_millis(200));

        let raw = session.full_output();
        assert!(raw.contains("\x1b[1;32m"));
        assert_eq!(session.full_clean_output(), strip_ansi(&raw));
        assert!(session.full_clean_output().contains("green plain"));
        Ok(())
    }

    #[test]
    fn dump_output_shows_raw_and_clean_views() -> Result<(), Box<dyn Error>> {
        let mut session = sh("printf '\\033[1mbold\\033[0m'; sleep 5")?;
        session.expect_prompt("bold", STEP_TIMEOUT)?;
        let dump = session.dump_output();
        assert!(dump.starts_with("=== RAW OUTPUT ===\n"));
        assert!(dump.contains("\\u{1b}[1mbold"));
        assert!(dump.contains("=== CLEANED OUTPUT ===\nbold"));
        assert!(dump.ends_with("=== END OUTPUT ===\n"));
        Ok(())
    }
}
