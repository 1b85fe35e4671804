//! Blocking text menu over a `Library`.
//!
//! # Invariants
//! - Every core failure is printed and the loop continues.
//! - The session ends on an Exit selection or end of input, never on error
//!   results from the library.

use libris_core::{
    ActionReport, Book, BookUpdate, Library, RecordStore, User, UserUpdate,
};
use log::debug;
use std::io::{self, BufRead, Write};

const BORDER: &str = "--------------------";
const GOODBYE: &str =
    "\nThank you for visiting the New World Library. Goodbye, Have a nice day!\n";
const INVALID: &str =
    "\nIt seems you have entered an invalid option. Please enter an option from the list.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Menu {
    Books,
    Users,
    Circulation,
}

impl Menu {
    fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(Self::Books),
            "2" => Some(Self::Users),
            "3" => Some(Self::Circulation),
            _ => None,
        }
    }

    fn lines(self) -> &'static [&'static str] {
        match self {
            Self::Books => &[
                "Book Management Menu",
                "",
                "1. Add Book",
                "2. List Books",
                "3. Update Book",
                "4. Delete Book",
                "5. Exit",
            ],
            Self::Users => &[
                "User Management Menu",
                "",
                "1. Add User",
                "2. List Users",
                "3. Update User",
                "4. Delete User",
                "5. Exit",
            ],
            Self::Circulation => &[
                "Check In/Out Management Menu",
                "1. Check In Book",
                "2. Check Out Book",
                "3. Exit",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Runs the menu loop until Exit or end of input.
pub fn run<S, R, W>(library: &mut Library<S>, input: R, output: W) -> io::Result<()>
where
    S: RecordStore,
    R: BufRead,
    W: Write,
{
    let mut session = Session {
        library,
        input,
        output,
    };
    session.greet()?;
    while session.step()? == Flow::Continue {}
    session.output.flush()
}

struct Session<'l, S: RecordStore, R, W> {
    library: &'l mut Library<S>,
    input: R,
    output: W,
}

impl<S: RecordStore, R: BufRead, W: Write> Session<'_, S, R, W> {
    fn greet(&mut self) -> io::Result<()> {
        let warnings: Vec<String> = self
            .library
            .load_warnings()
            .into_iter()
            .map(str::to_string)
            .collect();
        for warning in warnings {
            writeln!(self.output, "Warning: {warning}")?;
        }

        let report = self.library.consistency();
        if !report.is_consistent() {
            writeln!(self.output, "Warning: stored records disagree:")?;
            for discrepancy in &report.discrepancies {
                writeln!(self.output, "  - {discrepancy}")?;
            }
        }

        writeln!(
            self.output,
            "\nWelcome to the New World Library. Please select an option (Enter only the number)\n"
        )
    }

    fn step(&mut self) -> io::Result<Flow> {
        let menu = loop {
            writeln!(self.output, "1. Book Management")?;
            writeln!(self.output, "2. User Management")?;
            writeln!(self.output, "3. Check Out Management")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                return Ok(Flow::Exit);
            };
            match Menu::from_choice(choice.trim()) {
                Some(menu) => break menu,
                None => writeln!(self.output, "{INVALID}")?,
            }
        };

        self.framed(menu.lines())?;
        let Some(choice) =
            self.prompt("\nPlease, select an option from the above list (Enter only the number): ")?
        else {
            return Ok(Flow::Exit);
        };
        debug!(
            "event=menu_select module=cli menu={:?} choice={}",
            menu,
            choice.trim()
        );

        match menu {
            Menu::Books => self.books(choice.trim()),
            Menu::Users => self.users(choice.trim()),
            Menu::Circulation => self.circulation(choice.trim()),
        }
    }

    fn books(&mut self, choice: &str) -> io::Result<Flow> {
        match choice {
            "1" => {
                let Some([title, author, isbn]) =
                    self.prompts(["Enter title: ", "Enter author: ", "Enter ISBN: "])?
                else {
                    return Ok(Flow::Exit);
                };
                let book = Book::new(title, author, isbn);
                let title = book.title.clone();
                let result = self.library.add_book(book);
                self.report(ActionReport::from_result(&result, |_| {
                    format!("Book '{title}' added successfully.")
                }))?;
            }
            "2" => {
                writeln!(self.output, "\nList of Books:")?;
                let lines: Vec<String> = self
                    .library
                    .catalog()
                    .list()
                    .iter()
                    .map(Book::to_string)
                    .collect();
                self.listing(
                    &lines,
                    "No books available. Please add books to the library.",
                )?;
            }
            "3" => {
                let Some([isbn, title, author, new_isbn]) = self.prompts([
                    "Enter ISBN of the book to update: ",
                    "Enter new title (Press Enter to skip): ",
                    "Enter new author (Press Enter to skip): ",
                    "Enter new ISBN (Press Enter to skip): ",
                ])?
                else {
                    return Ok(Flow::Exit);
                };
                writeln!(self.output, "\nUpdating the details of the book...")?;
                let update = BookUpdate::from_answers(&title, &author, &new_isbn);
                let result = self.library.update_book(&isbn, &update);
                self.report(ActionReport::from_result(&result, |book| {
                    format!("Book '{}' updated successfully.", book.title)
                }))?;
            }
            "4" => {
                let Some([isbn]) = self.prompts(["Enter ISBN of the book to delete: "])? else {
                    return Ok(Flow::Exit);
                };
                writeln!(self.output, "\nDeleting the book...")?;
                let result = self.library.remove_book(&isbn);
                self.report(ActionReport::from_result(&result, |book| {
                    format!("Book '{}' removed successfully.", book.title)
                }))?;
            }
            "5" => return self.goodbye(),
            _ => writeln!(self.output, "{INVALID}")?,
        }
        Ok(Flow::Continue)
    }

    fn users(&mut self, choice: &str) -> io::Result<Flow> {
        match choice {
            "1" => {
                writeln!(self.output, "\nPlease enter the following details:")?;
                let Some([name, user_id]) =
                    self.prompts(["Enter user name: ", "Enter user ID: "])?
                else {
                    return Ok(Flow::Exit);
                };
                let user = User::new(name, user_id.trim());
                let name = user.name.clone();
                let result = self.library.add_user(user);
                self.report(ActionReport::from_result(&result, |_| {
                    format!("User '{name}' added successfully.")
                }))?;
            }
            "2" => {
                writeln!(self.output, "\nList of Users:\n")?;
                let lines: Vec<String> = self
                    .library
                    .membership()
                    .list()
                    .iter()
                    .map(User::to_string)
                    .collect();
                self.listing(&lines, "No users found. Add users to the library.")?;
            }
            "3" => {
                let Some([user_id, name, new_user_id]) = self.prompts([
                    "Enter user ID of the user to update: ",
                    "Enter new name (Press Enter to skip): ",
                    "Enter new user ID (Press Enter to skip): ",
                ])?
                else {
                    return Ok(Flow::Exit);
                };
                writeln!(self.output, "\nUpdating the details of the user...\n")?;
                let update = UserUpdate::from_answers(&name, new_user_id.trim());
                let result = self.library.update_user(user_id.trim(), &update);
                self.report(ActionReport::from_result(&result, |user| {
                    format!("User '{}' updated successfully.", user.name)
                }))?;
            }
            "4" => {
                let Some([user_id]) = self.prompts(["Enter user ID of the user to delete: "])?
                else {
                    return Ok(Flow::Exit);
                };
                writeln!(self.output, "\nDeleting the user...\n")?;
                let result = self.library.remove_user(user_id.trim());
                self.report(ActionReport::from_result(&result, |user| {
                    format!("User '{}' removed successfully.", user.name)
                }))?;
            }
            "5" => return self.goodbye(),
            _ => writeln!(self.output, "{INVALID}")?,
        }
        Ok(Flow::Continue)
    }

    fn circulation(&mut self, choice: &str) -> io::Result<Flow> {
        let checking_out = match choice {
            "1" => false,
            "2" => true,
            "3" => return self.goodbye(),
            _ => {
                writeln!(self.output, "{INVALID}")?;
                return Ok(Flow::Continue);
            }
        };

        let isbn_prompt = if checking_out {
            "Enter ISBN of the book to check out: "
        } else {
            "Enter ISBN of the book to check in: "
        };
        let Some([user_id, isbn]) = self.prompts(["Enter user ID: ", isbn_prompt])? else {
            return Ok(Flow::Exit);
        };

        let result = if checking_out {
            writeln!(self.output, "\nChecking out a book...")?;
            self.library.check_out(user_id.trim(), &isbn)
        } else {
            writeln!(self.output, "\nChecking in a book...")?;
            self.library.return_book(user_id.trim(), &isbn)
        };
        self.report(ActionReport::from_result(&result, |receipt| receipt.to_string()))?;
        Ok(Flow::Continue)
    }

    fn goodbye(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "{GOODBYE}")?;
        Ok(Flow::Exit)
    }

    fn report(&mut self, report: ActionReport) -> io::Result<()> {
        if report.ok {
            writeln!(self.output, "{report}")
        } else {
            writeln!(self.output, "Failed: {report}")
        }
    }

    fn listing(&mut self, lines: &[String], empty: &str) -> io::Result<()> {
        if lines.is_empty() {
            return writeln!(self.output, "{empty}");
        }
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    fn framed(&mut self, lines: &[&str]) -> io::Result<()> {
        writeln!(self.output, "{BORDER}")?;
        writeln!(self.output)?;
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        writeln!(self.output, "{BORDER}")
    }

    /// Reads one answer per label. `None` means input ended.
    fn prompts<const N: usize>(&mut self, labels: [&str; N]) -> io::Result<Option<[String; N]>> {
        let mut answers: [String; N] = std::array::from_fn(|_| String::new());
        for (answer, label) in answers.iter_mut().zip(labels) {
            match self.prompt(label)? {
                Some(line) => *answer = line,
                None => return Ok(None),
            }
        }
        Ok(Some(answers))
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::run;
    use libris_core::{Book, Collection, Library, LibraryConfig, MemoryStore, User};
    use std::io::Cursor;

    fn session(library: &mut Library<MemoryStore>, script: &str) -> String {
        let mut output = Vec::new();
        run(library, Cursor::new(script.to_string()), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn seeded(books: &[Book], users: &[User]) -> Library<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(Collection::Books, books).unwrap();
        store.seed(Collection::Users, users).unwrap();
        Library::with_store(store)
    }

    #[test]
    fn add_and_list_books_then_exit() {
        let mut library = seeded(&[], &[]);
        let script = "1\n1\n1984\nGeorge Orwell\n 978-0451524935 \n1\n2\n1\n5\n";
        let out = session(&mut library, script);

        assert!(out.contains("Book '1984' added successfully."));
        assert!(out.contains("Book: 1984 by George Orwell (ISBN: 978-0451524935) - Available"));
        assert!(out.contains("Goodbye"));
        assert_eq!(library.catalog().len(), 1);
    }

    #[test]
    fn invalid_main_choice_reprompts() {
        let mut library = seeded(&[], &[]);
        let out = session(&mut library, "9\n2\n2\n2\n5\n");
        assert!(out.contains("invalid option"));
        assert!(out.contains("No users found. Add users to the library."));
    }

    #[test]
    fn checkout_failure_is_reported_and_loop_continues() {
        let mut library = seeded(
            &[Book::new("1984", "George Orwell", "978-0451524935")],
            &[User::new("Alice Smith", "U1001")],
        );
        let script = "3\n2\nU1001\n978-0451524935\n3\n2\nU1001\n978-0451524935\n3\n1\nU1001\n978-0451524935\n3\n3\n";
        let out = session(&mut library, script);

        assert!(out.contains("checked out by Alice Smith (ID: U1001)."));
        assert!(out.contains("Failed: book 978-0451524935 is already checked out."));
        assert!(out.contains("returned by Alice Smith"));
        assert!(!library.catalog().find_by_isbn("978-0451524935").unwrap().checked_out);
    }

    #[test]
    fn duplicate_user_and_blank_update_fields() {
        let mut library = seeded(&[], &[User::new("Alice", "U1")]);
        let script = "2\n1\nAlice Again\nU1\n2\n3\nU1\n\nU9\n2\n2\n2\n5\n";
        let out = session(&mut library, script);

        assert!(out.contains("Failed: User with ID U1 already exists."));
        assert!(out.contains("User 'Alice' updated successfully."));
        assert!(out.contains("User: Alice (ID: U9) - Borrowed Books: No books borrowed"));
    }

    #[test]
    fn end_of_input_ends_session_quietly() {
        let mut library = seeded(&[], &[]);
        let out = session(&mut library, "1\n1\n1984\n");
        assert!(!out.contains("Goodbye"));
        assert!(library.catalog().is_empty());
    }

    #[test]
    fn session_changes_reach_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LibraryConfig::in_dir(dir.path());
        let mut library = Library::open(&config);

        let mut output = Vec::new();
        let script = "2\n1\nAlice Smith\nU1001\n1\n1\nDune\nFrank Herbert\n978-0441013593\n3\n2\nU1001\n978-0441013593\n";
        run(&mut library, Cursor::new(script), &mut output).unwrap();

        let reopened = Library::open(&config);
        assert!(reopened.catalog().find_by_isbn("978-0441013593").unwrap().checked_out);
        assert!(reopened.membership().find_by_id("U1001").unwrap().holds("978-0441013593"));
    }

    #[test]
    fn startup_prints_stored_disagreements() {
        let mut lent = Book::new("1984", "George Orwell", "978-0451524935");
        lent.checked_out = true;
        let mut library = seeded(&[lent], &[]);
        let out = session(&mut library, "");
        assert!(out.contains("stored records disagree"));
        assert!(out.contains("book 978-0451524935 is checked out but no user holds it"));
    }
}
