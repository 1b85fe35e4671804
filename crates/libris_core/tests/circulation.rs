use libris_core::{
    Action, Book, BookUpdate, Catalog, CirculationError, Classify, Collection, Discrepancy,
    ErrorKind, JsonFileStore, Library, MemoryStore, Membership, StateError, User,
};

const ISBN: &str = "978-0451524935";

fn orwell() -> Book {
    Book::new("1984", "George Orwell", ISBN)
}

fn alice() -> User {
    User::new("Alice Smith", "U1001")
}

fn library_with(books: &[Book], users: &[User]) -> (Library<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    store.seed(Collection::Books, books).unwrap();
    store.seed(Collection::Users, users).unwrap();
    (Library::with_store(store.clone()), store)
}

fn on_loan() -> (Book, User) {
    let mut book = orwell();
    book.checked_out = true;
    let mut user = alice();
    user.borrowed_isbns.push(ISBN.to_string());
    (book, user)
}

#[test]
fn check_out_flags_book_and_records_borrower() {
    let (mut library, store) = library_with(&[orwell()], &[alice()]);

    let receipt = library.check_out("U1001", ISBN).unwrap();
    assert_eq!(receipt.action, Action::CheckOut);
    assert_eq!(receipt.title, "1984");
    assert_eq!(receipt.user_name, "Alice Smith");
    assert_eq!(
        receipt.to_string(),
        "Book '1984' (ISBN: 978-0451524935) checked out by Alice Smith (ID: U1001)."
    );

    assert!(library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    let held = &library.membership().find_by_id("U1001").unwrap().borrowed_isbns;
    assert_eq!(held.iter().filter(|isbn| *isbn == ISBN).count(), 1);
    assert!(library.consistency().is_consistent());

    assert_eq!(store.write_count(Collection::Books), 1);
    assert_eq!(store.write_count(Collection::Users), 1);
    let reloaded = Library::with_store(store);
    assert!(reloaded.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert!(reloaded.membership().find_by_id("U1001").unwrap().holds(ISBN));
}

#[test]
fn check_out_trims_isbn_argument() {
    let (mut library, _store) = library_with(&[orwell()], &[alice()]);
    let receipt = library.check_out("U1001", "  978-0451524935  ").unwrap();
    assert_eq!(receipt.isbn, ISBN);
    assert_eq!(
        library.membership().find_by_id("U1001").unwrap().borrowed_isbns,
        vec![ISBN.to_string()]
    );
}

#[test]
fn double_check_out_fails_without_state_change() {
    let (book, user) = on_loan();
    let (mut library, store) = library_with(&[book.clone()], &[user.clone()]);

    let err = library.check_out("U1001", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::InvalidState(StateError::AlreadyCheckedOut { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    assert_eq!(library.catalog().find_by_isbn(ISBN), Some(&book));
    assert_eq!(library.membership().find_by_id("U1001"), Some(&user));
    assert_eq!(store.write_count(Collection::Books), 0);
    assert_eq!(store.write_count(Collection::Users), 0);
}

#[test]
fn check_out_rolls_back_flag_when_user_already_holds_isbn() {
    let mut user = alice();
    user.borrowed_isbns.push(ISBN.to_string());
    let (mut library, store) = library_with(&[orwell()], &[user]);

    let err = library.check_out("U1001", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::InvalidState(StateError::AlreadyBorrowed { .. })
    ));
    assert!(!library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert_eq!(store.write_count(Collection::Books), 0);
}

#[test]
fn lookups_fail_before_any_transition() {
    let (mut library, store) = library_with(&[orwell()], &[alice()]);

    let err = library.check_out("U404", ISBN).unwrap_err();
    assert!(matches!(err, CirculationError::UserNotFound(ref id) if id == "U404"));
    assert_eq!(err.to_string(), "User with ID U404 not found.");

    let err = library.return_book("U1001", "missing").unwrap_err();
    assert!(matches!(err, CirculationError::BookNotFound(ref isbn) if isbn == "missing"));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(!library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert_eq!(store.write_count(Collection::Books), 0);
}

#[test]
fn return_clears_flag_and_borrower_entry() {
    let (book, user) = on_loan();
    let (mut library, store) = library_with(&[book], &[user]);

    let receipt = library.return_book("U1001", ISBN).unwrap();
    assert_eq!(receipt.action, Action::Return);
    assert!(receipt.to_string().contains("returned by Alice Smith"));

    assert!(!library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert!(library
        .membership()
        .find_by_id("U1001")
        .unwrap()
        .borrowed_isbns
        .is_empty());
    assert_eq!(store.write_count(Collection::Books), 1);
    assert_eq!(store.write_count(Collection::Users), 1);
}

#[test]
fn return_by_non_holder_restores_flag() {
    let (book, holder) = on_loan();
    let other = User::new("Bob Jones", "U2002");
    let (mut library, store) = library_with(&[book], &[holder.clone(), other.clone()]);

    let err = library.return_book("U2002", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::InvalidState(StateError::NotBorrowed { .. })
    ));

    assert!(library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert_eq!(library.membership().find_by_id("U1001"), Some(&holder));
    assert_eq!(library.membership().find_by_id("U2002"), Some(&other));
    assert_eq!(store.write_count(Collection::Books), 0);
}

#[test]
fn return_of_available_book_is_rejected() {
    let (mut library, _store) = library_with(&[orwell()], &[alice()]);
    let err = library.return_book("U1001", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::InvalidState(StateError::NotCheckedOut { .. })
    ));
    assert!(!library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
}

#[test]
fn failed_books_write_undoes_both_sides() {
    let (mut library, store) = library_with(&[orwell()], &[alice()]);
    store.reject_writes(Collection::Books);

    let err = library.check_out("U1001", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::Persistence {
            collection: Collection::Books,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);

    assert!(!library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert!(!library.membership().find_by_id("U1001").unwrap().holds(ISBN));
    assert_eq!(store.write_count(Collection::Users), 0);

    store.accept_writes(Collection::Books);
    library.check_out("U1001", ISBN).unwrap();
}

#[test]
fn failed_users_write_after_books_write_leaves_files_disagreeing() {
    let (mut library, store) = library_with(&[orwell()], &[alice()]);
    store.reject_writes(Collection::Users);

    let err = library.check_out("U1001", ISBN).unwrap_err();
    match &err {
        CirculationError::PartiallyPersisted {
            action,
            user_id,
            isbn,
            ..
        } => {
            assert_eq!(*action, Action::CheckOut);
            assert_eq!(user_id, "U1001");
            assert_eq!(isbn, ISBN);
        }
        other => panic!("expected partial persistence, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);

    // The in-memory view stays consistent; only the users record is stale.
    assert!(library.consistency().is_consistent());

    let reloaded = Library::with_store(store.clone());
    assert!(reloaded.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert!(!reloaded.membership().find_by_id("U1001").unwrap().holds(ISBN));
    assert_eq!(
        reloaded.consistency().discrepancies,
        vec![Discrepancy::FlaggedWithoutHolder {
            isbn: ISBN.to_string()
        }]
    );

    store.accept_writes(Collection::Users);
    library.return_book("U1001", ISBN).unwrap();
    let healed = Library::with_store(store);
    assert!(healed.consistency().is_consistent());
}

#[test]
fn circulation_can_be_driven_from_separate_registries() {
    let store = MemoryStore::new();
    store.seed(Collection::Books, &[orwell()]).unwrap();
    store.seed(Collection::Users, &[alice()]).unwrap();
    let mut catalog = Catalog::open(store.clone());
    let mut membership = Membership::open(store);

    {
        let mut circulation = libris_core::Circulation::new(&mut catalog, &mut membership);
        circulation.check_out("U1001", ISBN).unwrap();
        circulation.return_book("U1001", ISBN).unwrap();
        circulation.check_out("U1001", ISBN).unwrap();
    }

    assert!(catalog.find_by_isbn(ISBN).unwrap().checked_out);
    assert_eq!(
        membership.find_by_id("U1001").unwrap().borrowed_isbns,
        vec![ISBN.to_string()]
    );
}

#[test]
fn update_keeps_order_after_checkout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let mut library = Library::with_store(store.clone());
    library.add_book(orwell()).unwrap();
    library
        .add_book(Book::new("Dune", "Frank Herbert", "978-0441013593"))
        .unwrap();
    library.add_user(alice()).unwrap();

    library.check_out("U1001", ISBN).unwrap();

    let reloaded = Library::with_store(store);
    let order: Vec<&str> = reloaded
        .catalog()
        .list()
        .iter()
        .map(|book| book.isbn.as_str())
        .collect();
    assert_eq!(order, vec![ISBN, "978-0441013593"]);
    assert!(reloaded.consistency().is_consistent());
}

#[test]
fn failed_books_write_during_return_restores_held_order() {
    let mut lent = orwell();
    lent.checked_out = true;
    let mut dune = Book::new("Dune", "Frank Herbert", "978-0441013593");
    dune.checked_out = true;
    let mut user = alice();
    user.borrowed_isbns = vec![ISBN.to_string(), "978-0441013593".to_string()];
    let (mut library, store) = library_with(&[lent, dune], &[user.clone()]);
    store.reject_writes(Collection::Books);

    let err = library.return_book("U1001", ISBN).unwrap_err();
    assert!(matches!(
        err,
        CirculationError::Persistence {
            action: Action::Return,
            collection: Collection::Books,
            ..
        }
    ));

    assert_eq!(library.membership().find_by_id("U1001"), Some(&user));
    assert!(library.catalog().find_by_isbn(ISBN).unwrap().checked_out);
    assert!(library.consistency().is_consistent());
    assert_eq!(store.write_count(Collection::Users), 0);
}

#[test]
fn loan_blocks_rekey_and_removal_until_returned() {
    let (mut library, _store) = library_with(&[orwell()], &[alice()]);
    library.check_out("U1001", ISBN).unwrap();

    let err = library
        .update_book(ISBN, &BookUpdate::from_answers("", "", "978-0000000001"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(
        err.to_string(),
        "book 978-0451524935 is checked out and must be returned first"
    );
    assert!(library.remove_book(ISBN).is_err());
    assert!(library.remove_user("U1001").is_err());
    assert!(library.consistency().is_consistent());

    library.return_book("U1001", ISBN).unwrap();
    assert!(library.consistency().is_consistent());

    library
        .update_book(ISBN, &BookUpdate::from_answers("", "", "978-0000000001"))
        .unwrap();
    library.remove_book("978-0000000001").unwrap();
    library.remove_user("U1001").unwrap();
    assert!(library.consistency().is_consistent());
}
