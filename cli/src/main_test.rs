use super::*;
use hypewall::entry::RoleHints;
use hypewall::notice::Notice;
use hypewall::view::View;

// =========================================================================
// argument parsing
// =========================================================================

#[test]
fn create_defaults_to_professional() {
    let cli = Cli::try_parse_from(["hypewall", "create", "Sam"]).unwrap();
    assert_eq!(cli.api_base, DEFAULT_API_BASE);
    let Command::Create { recipient_name, aesthetic } = cli.command else {
        panic!("expected create");
    };
    assert_eq!(recipient_name, "Sam");
    assert_eq!(aesthetic, "professional");
}

#[test]
fn post_takes_author_and_color() {
    let cli = Cli::try_parse_from([
        "hypewall",
        "--api-base",
        "https://api.test",
        "post",
        "ABC123",
        "You did it!",
        "--author",
        "Ann",
        "--color",
        "#FFD700",
    ])
    .unwrap();
    assert_eq!(cli.api_base, "https://api.test");
    let Command::Post(args) = cli.command else {
        panic!("expected post");
    };
    assert_eq!(args.target, "ABC123");
    assert_eq!(args.message, "You did it!");
    assert_eq!(args.author, "Ann");
    assert_eq!(args.color.as_deref(), Some("#FFD700"));
}

#[test]
fn watch_accepts_tick_limit() {
    let cli = Cli::try_parse_from(["hypewall", "watch", "https://wall.test/view/vt-1", "--ticks", "3"]).unwrap();
    assert!(matches!(cli.command, Command::Watch { ticks: Some(3), .. }));
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["hypewall"]).is_err());
}

// =========================================================================
// target resolution
// =========================================================================

#[test]
fn view_link_resolves_to_viewer_entry() {
    assert_eq!(entry_from_target("https://wall.test/view/vt-1"), EntryPoint::View("vt-1".to_owned()));
    assert_eq!(entry_from_target("https://wall.test/?view=vt-2"), EntryPoint::View("vt-2".to_owned()));
}

#[test]
fn board_link_carries_hints() {
    assert_eq!(
        entry_from_target("https://wall.test/?board=b-1&contribute=1"),
        EntryPoint::Board { board_id: "b-1".to_owned(), hints: RoleHints { view: false, contribute: true } }
    );
}

#[test]
fn encoded_query_values_are_decoded() {
    assert_eq!(
        entry_from_target("https://wall.test/?contribute=b%2D9"),
        EntryPoint::Contribute("b-9".to_owned())
    );
}

#[test]
fn bare_text_is_a_join_code() {
    assert_eq!(entry_from_target(" ABC123 "), EntryPoint::Code("ABC123".to_owned()));
}

#[test]
fn link_without_entry_is_landing() {
    assert!(entry_from_target("https://wall.test/").is_landing());
}

// =========================================================================
// helpers
// =========================================================================

#[test]
fn parse_aesthetic_lists_known_ids_on_error() {
    assert_eq!(parse_aesthetic("tech-neon").unwrap(), Aesthetic::TechNeon);
    let err = parse_aesthetic("vaporwave").unwrap_err().to_string();
    assert!(err.contains("vaporwave"));
    assert!(err.contains("retro-90s"));
}

#[test]
fn accept_turns_notices_into_errors() {
    assert!(matches!(accept(Effect::PostMessage), Ok(Effect::PostMessage)));
    let err = accept(Effect::Notify(Notice::warning("Please write a message!"))).unwrap_err();
    assert_eq!(err.to_string(), "Please write a message!");
}

#[test]
fn contributor_setup_has_no_wall() {
    let setup = EntrySetup {
        view: View::Contributor,
        recipient_name: "Sam".to_owned(),
        background: Aesthetic::Professional.background(),
        share_links: None,
        palette: Some(&Aesthetic::Professional.palette()[..]),
        poll_board_id: None,
    };
    assert!(matches!(wall_board_id(&setup), Err(CliError::Rejected(_))));
}

#[test]
fn format_card_shows_time_author_and_color() {
    let card = CommentCard {
        author: "Ann".to_owned(),
        message: "Hi".to_owned(),
        color: "#ABC".to_owned(),
        time: "Oct 16, 09:00 AM".to_owned(),
    };
    assert_eq!(format_card(&card), "[Oct 16, 09:00 AM] Ann (#ABC): Hi");
}
